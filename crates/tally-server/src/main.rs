//! Tally - self-hosted invoicing dashboard backend

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::Config;
use tally_api::{create_router, AppState};
use tally_auth::{AuthService, PasswordHasher, RouteTable, SessionCodec, SessionPolicy};
use tally_db::{Database, NewUser, Role};

/// Tally - invoices, customers, and revenue behind one login
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "TALLY_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TALLY_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration; a short signing key refuses to start
    let config = Config::load(&args.config)?;
    config.validate()?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting Tally v{}", env!("CARGO_PKG_VERSION"));

    // Create the data directory for the SQLite file
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    // Build the auth components from the immutable config snapshot
    let hasher = PasswordHasher::new(config.auth.hash_time_cost)?;
    let codec = Arc::new(SessionCodec::new(
        config.auth.secret.as_bytes(),
        config.auth.session_duration_secs,
        config.auth.max_session_secs,
    )?);
    let policy = SessionPolicy::new(
        config.auth.session_duration_secs,
        config.auth.refresh_threshold_secs,
        config.auth.max_session_secs,
    );
    let routes = Arc::new(RouteTable::default());
    let auth = AuthService::new(db.clone(), hasher.clone(), codec.clone());

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let password_hash = hasher.hash("admin")?;
        db.insert_user(NewUser {
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
        info!("Default admin user created (email: admin@localhost, password: admin)");
    }

    // Create application state
    let state = AppState::new(db, auth, hasher, codec, policy, routes);

    // Create router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
