//! Customer operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Customer, CustomerSummary, NewCustomer};
use crate::repository::Database;

impl Database {
    // ==================== Customer Operations ====================

    /// Insert a new customer
    pub async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, DbError> {
        let now = Utc::now();

        if self.get_customer_by_email(&customer.email).await?.is_some() {
            return Err(DbError::Duplicate(format!(
                "Customer '{}' already exists",
                customer.email
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO customers (name, email, image_url, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.image_url)
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Customer {
            id,
            name: customer.name,
            email: customer.email,
            image_url: customer.image_url,
            created_at: now,
        })
    }

    /// Get a customer by ID
    pub async fn get_customer_by_id(&self, id: i64) -> Result<Option<Customer>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, image_url, created_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Customer::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a customer by email
    pub async fn get_customer_by_email(&self, email: &str) -> Result<Option<Customer>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, image_url, created_at
            FROM customers
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Customer::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List customers with aggregated invoice figures
    pub async fn list_customer_summaries(&self) -> Result<Vec<CustomerSummary>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                c.id, c.name, c.email, c.image_url,
                COUNT(i.id) as total_invoices,
                COALESCE(SUM(CASE WHEN i.status = 'pending' THEN i.amount_cents ELSE 0 END), 0) as total_pending_cents,
                COALESCE(SUM(CASE WHEN i.status = 'paid' THEN i.amount_cents ELSE 0 END), 0) as total_paid_cents
            FROM customers c
            LEFT JOIN invoices i ON i.customer_id = c.id
            GROUP BY c.id, c.name, c.email, c.image_url
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| CustomerSummary::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Delete a customer (cascades to its invoices)
    pub async fn delete_customer(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all customers
    pub async fn customer_count(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }
}
