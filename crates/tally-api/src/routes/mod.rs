//! API routes

mod auth;
mod customers;
mod dashboard;
mod health;
mod invoices;
mod types;
mod users;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::json;

use crate::middleware::session_gate;
use crate::state::AppState;

/// Landing handler for unauthenticated visitors; logged-in users are
/// bounced to the dashboard before this runs.
async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "name": "tally",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(auth::routes())
        .merge(dashboard::routes())
        .merge(customers::routes())
        .merge(invoices::routes())
        .merge(users::routes())
        // The session gate wraps every application route above
        .layer(from_fn_with_state(state.clone(), session_gate))
        // Health stays reachable without a session
        .merge(health::routes())
        .with_state(state)
}
