//! Customer routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tally_db::{Customer, NewCustomer};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

use super::types::{CreateCustomerRequest, CustomerResponse};

/// GET /api/customers
async fn list_customers(
    _user: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.db.list_customer_summaries().await?;

    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// POST /api/customers
async fn create_customer(
    _user: RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Customer name cannot be empty".to_string()));
    }
    if !request.email.contains('@') {
        return Err(ApiError::BadRequest("Customer email is not valid".to_string()));
    }

    debug!("Creating customer: {}", request.email);

    let customer = state
        .db
        .insert_customer(NewCustomer {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            image_url: request.image_url,
        })
        .await?;

    info!("Created customer: {}", customer.email);

    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/customers/{id}
async fn get_customer(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state
        .db
        .get_customer_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer: {}", id)))?;

    Ok(Json(customer))
}

/// DELETE /api/customers/{id}
async fn delete_customer(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!("Deleting customer: {}", id);

    let deleted = state.db.delete_customer(id).await?;

    if deleted {
        info!("Deleted customer: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Customer: {}", id)))
    }
}

/// Create customer routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route("/api/customers/{id}", get(get_customer))
        .route("/api/customers/{id}", delete(delete_customer))
}
