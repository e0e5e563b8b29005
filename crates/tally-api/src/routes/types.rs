//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use tally_db::{CustomerSummary, InvoiceWithCustomer, User};

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// The authenticated user, returned after login/signup
#[derive(Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl SessionResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

// ==================== User Types ====================

/// Create user request (admin)
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Update user request (admin)
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub password: Option<String>,
}

/// User response (without password)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

// ==================== Customer Types ====================

/// Create customer request
#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Customer response with invoice aggregates
#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image_url: Option<String>,
    pub total_invoices: i64,
    pub total_pending_cents: i64,
    pub total_paid_cents: i64,
}

impl From<CustomerSummary> for CustomerResponse {
    fn from(summary: CustomerSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            email: summary.email,
            image_url: summary.image_url,
            total_invoices: summary.total_invoices,
            total_pending_cents: summary.total_pending_cents,
            total_paid_cents: summary.total_paid_cents,
        }
    }
}

// ==================== Invoice Types ====================

/// Create invoice request
#[derive(Deserialize)]
pub struct CreateInvoiceRequest {
    pub customer_id: i64,
    pub amount_cents: i64,
    pub status: String,
}

/// Update invoice request
#[derive(Deserialize)]
pub struct UpdateInvoiceRequest {
    pub amount_cents: Option<i64>,
    pub status: Option<String>,
}

/// Invoice response joined with customer data
#[derive(Serialize)]
pub struct InvoiceResponse {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub amount_cents: i64,
    pub status: String,
    pub created_at: String,
}

impl From<InvoiceWithCustomer> for InvoiceResponse {
    fn from(invoice: InvoiceWithCustomer) -> Self {
        Self {
            id: invoice.id,
            customer_id: invoice.customer_id,
            customer_name: invoice.customer_name,
            customer_email: invoice.customer_email,
            amount_cents: invoice.amount_cents,
            status: invoice.status.as_str().to_string(),
            created_at: invoice.created_at.to_rfc3339(),
        }
    }
}

/// Paginated invoices response
#[derive(Serialize)]
pub struct InvoicesListResponse {
    pub invoices: Vec<InvoiceResponse>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

/// Invoice list query parameters
#[derive(Deserialize, Default)]
pub struct InvoicesQueryParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_offset")]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_offset() -> i64 {
    0
}

fn default_limit() -> i64 {
    50
}

// ==================== Dashboard Types ====================

/// Card aggregates for the dashboard landing view
#[derive(Serialize)]
pub struct DashboardResponse {
    pub invoice_count: i64,
    pub customer_count: i64,
    pub paid_cents: i64,
    pub pending_cents: i64,
}

/// One month of revenue
#[derive(Serialize)]
pub struct MonthlyRevenueResponse {
    pub month: String,
    pub amount_cents: i64,
}

/// Revenue chart data, oldest month first
#[derive(Serialize)]
pub struct RevenueResponse {
    pub months: Vec<MonthlyRevenueResponse>,
}
