//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidRole(String),
    InvalidInvoiceStatus(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidRole(s) => write!(f, "Invalid role: {}", s),
            ParseError::InvalidInvoiceStatus(s) => write!(f, "Invalid invoice status: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
///
/// Wire strings are upper-case because the session token embeds them
/// verbatim in its `role` claim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            "GUEST" => Ok(Role::Guest),
            _ => Err(ParseError::InvalidRole(s.to_string())),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Customer model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New customer (for insertion)
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub image_url: Option<String>,
}

/// Customer with aggregated invoice figures
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image_url: Option<String>,
    pub total_invoices: i64,
    pub total_pending_cents: i64,
    pub total_paid_cents: i64,
}

/// Invoice status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(ParseError::InvalidInvoiceStatus(s.to_string())),
        }
    }
}

/// Invoice model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub customer_id: i64,
    /// Amount in cents to avoid floating-point money
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

/// New invoice (for insertion)
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: i64,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
}

/// Invoice update (for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub amount_cents: Option<i64>,
    pub status: Option<InvoiceStatus>,
}

/// Invoice joined with its customer for list views
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithCustomer {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

/// Revenue for one month bucket
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    /// Month key in `YYYY-MM` form
    pub month: String,
    pub amount_cents: i64,
}

/// Aggregates backing the dashboard cards
#[derive(Debug, Clone, Serialize, Default)]
pub struct DashboardSummary {
    pub invoice_count: i64,
    pub customer_count: i64,
    pub paid_cents: i64,
    pub pending_cents: i64,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: Role::from_str(&role_str).unwrap_or(Role::Guest),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Customer {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            image_url: row.try_get("image_url")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for CustomerSummary {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(CustomerSummary {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            image_url: row.try_get("image_url")?,
            total_invoices: row.try_get("total_invoices")?,
            total_pending_cents: row.try_get("total_pending_cents")?,
            total_paid_cents: row.try_get("total_paid_cents")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Invoice {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("status")?;
        Ok(Invoice {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            amount_cents: row.try_get("amount_cents")?,
            status: InvoiceStatus::from_str(&status_str).unwrap_or(InvoiceStatus::Pending),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for InvoiceWithCustomer {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let status_str: String = row.try_get("status")?;
        Ok(InvoiceWithCustomer {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            amount_cents: row.try_get("amount_cents")?,
            status: InvoiceStatus::from_str(&status_str).unwrap_or(InvoiceStatus::Pending),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::User, Role::Guest] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("admin").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn test_invoice_status_round_trip() {
        for status in [InvoiceStatus::Pending, InvoiceStatus::Paid] {
            assert_eq!(InvoiceStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(InvoiceStatus::from_str("overdue").is_err());
    }
}
