//! Tally REST API
//!
//! This crate provides the Axum-based HTTP API for Tally: the
//! per-request session gate, the auth endpoints, and the dashboard
//! resources behind them.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use middleware::{CurrentUser, RequireAdmin, RequireAuth};
pub use routes::create_router;
pub use state::AppState;
