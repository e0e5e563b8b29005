//! Dashboard aggregate routes

use axum::{extract::State, routing::get, Json, Router};

use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

use super::types::{DashboardResponse, MonthlyRevenueResponse, RevenueResponse};

/// Months of history shown on the revenue chart
const REVENUE_MONTHS: i64 = 12;

/// GET /dashboard
async fn cards(
    _user: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let summary = state.db.dashboard_summary().await?;

    Ok(Json(DashboardResponse {
        invoice_count: summary.invoice_count,
        customer_count: summary.customer_count,
        paid_cents: summary.paid_cents,
        pending_cents: summary.pending_cents,
    }))
}

/// GET /dashboard/revenue
async fn revenue(
    _user: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<RevenueResponse>, ApiError> {
    let months = state
        .db
        .monthly_revenue(REVENUE_MONTHS)
        .await?
        .into_iter()
        .map(|m| MonthlyRevenueResponse {
            month: m.month,
            amount_cents: m.amount_cents,
        })
        .collect();

    Ok(Json(RevenueResponse { months }))
}

/// Create dashboard routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(cards))
        .route("/dashboard/revenue", get(revenue))
}
