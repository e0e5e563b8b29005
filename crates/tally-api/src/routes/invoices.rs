//! Invoice routes

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tally_db::{Invoice, InvoiceQuery, InvoiceStatus, NewInvoice, UpdateInvoice};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

use super::types::{
    CreateInvoiceRequest, InvoicesListResponse, InvoicesQueryParams, UpdateInvoiceRequest,
};

/// Upper bound on page size
const MAX_PAGE_SIZE: i64 = 100;

fn parse_status(status: &str) -> Result<InvoiceStatus, ApiError> {
    InvoiceStatus::from_str(status)
        .map_err(|_| ApiError::BadRequest(format!("Invalid invoice status: {}", status)))
}

/// GET /api/invoices
async fn list_invoices(
    _user: RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<InvoicesQueryParams>,
) -> Result<Json<InvoicesListResponse>, ApiError> {
    // Reject unknown status filters up front
    if let Some(status) = &params.status {
        parse_status(status)?;
    }

    let query = InvoiceQuery {
        search: params.search.clone(),
        status: params.status.clone(),
        offset: params.offset.max(0),
        limit: params.limit.clamp(1, MAX_PAGE_SIZE),
    };

    let invoices = state.db.list_invoices(&query).await?;
    let total = state.db.count_invoices(&query).await?;

    Ok(Json(InvoicesListResponse {
        invoices: invoices.into_iter().map(Into::into).collect(),
        total,
        offset: query.offset,
        limit: query.limit,
    }))
}

/// POST /api/invoices
async fn create_invoice(
    _user: RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    if request.amount_cents <= 0 {
        return Err(ApiError::BadRequest(
            "Invoice amount must be positive".to_string(),
        ));
    }
    let status = parse_status(&request.status)?;

    debug!("Creating invoice for customer {}", request.customer_id);

    let invoice = state
        .db
        .insert_invoice(NewInvoice {
            customer_id: request.customer_id,
            amount_cents: request.amount_cents,
            status,
        })
        .await?;

    info!("Created invoice {}", invoice.id);

    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /api/invoices/{id}
async fn get_invoice(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = state
        .db
        .get_invoice_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice: {}", id)))?;

    Ok(Json(invoice))
}

/// PUT /api/invoices/{id}
async fn update_invoice(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> Result<Json<Invoice>, ApiError> {
    debug!("Updating invoice: {}", id);

    if let Some(amount) = request.amount_cents {
        if amount <= 0 {
            return Err(ApiError::BadRequest(
                "Invoice amount must be positive".to_string(),
            ));
        }
    }
    let status = request.status.as_deref().map(parse_status).transpose()?;

    let updated = state
        .db
        .update_invoice(
            id,
            UpdateInvoice {
                amount_cents: request.amount_cents,
                status,
            },
        )
        .await?;

    if !updated {
        return Err(ApiError::NotFound(format!("Invoice: {}", id)));
    }

    let invoice = state
        .db
        .get_invoice_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice: {}", id)))?;

    info!("Updated invoice {}", id);

    Ok(Json(invoice))
}

/// DELETE /api/invoices/{id}
async fn delete_invoice(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    debug!("Deleting invoice: {}", id);

    let deleted = state.db.delete_invoice(id).await?;

    if deleted {
        info!("Deleted invoice: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Invoice: {}", id)))
    }
}

/// Create invoice routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list_invoices).post(create_invoice))
        .route("/api/invoices/{id}", get(get_invoice))
        .route("/api/invoices/{id}", put(update_invoice))
        .route("/api/invoices/{id}", delete(delete_invoice))
}
