//! Invoice operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{Invoice, InvoiceWithCustomer, NewInvoice, UpdateInvoice};
use crate::repository::Database;

/// Invoice list query parameters
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    /// Match against customer name or email (substring)
    pub search: Option<String>,
    /// Filter by status string ("pending" / "paid")
    pub status: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl Database {
    // ==================== Invoice Operations ====================

    /// Insert a new invoice
    pub async fn insert_invoice(&self, invoice: NewInvoice) -> Result<Invoice, DbError> {
        let now = Utc::now();

        // The referenced customer must exist; SQLite foreign keys are not
        // enforced on every connection, so check explicitly.
        if self.get_customer_by_id(invoice.customer_id).await?.is_none() {
            return Err(DbError::NotFound(format!(
                "Customer: {}",
                invoice.customer_id
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (customer_id, amount_cents, status, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(invoice.customer_id)
        .bind(invoice.amount_cents)
        .bind(invoice.status.as_str())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");

        Ok(Invoice {
            id,
            customer_id: invoice.customer_id,
            amount_cents: invoice.amount_cents,
            status: invoice.status,
            created_at: now,
        })
    }

    /// Get an invoice by ID
    pub async fn get_invoice_by_id(&self, id: i64) -> Result<Option<Invoice>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, customer_id, amount_cents, status, created_at
            FROM invoices
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Invoice::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List invoices joined with customer data, filtered and paginated
    pub async fn list_invoices(
        &self,
        query: &InvoiceQuery,
    ) -> Result<Vec<InvoiceWithCustomer>, DbError> {
        let search = query
            .search
            .as_deref()
            .map(|s| format!("%{}%", s))
            .unwrap_or_else(|| "%".to_string());
        let status = query.status.as_deref().unwrap_or("%");

        let rows = sqlx::query(
            r#"
            SELECT
                i.id, i.customer_id, i.amount_cents, i.status, i.created_at,
                c.name as customer_name, c.email as customer_email
            FROM invoices i
            JOIN customers c ON c.id = i.customer_id
            WHERE (c.name LIKE ? OR c.email LIKE ?)
              AND i.status LIKE ?
            ORDER BY i.created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&search)
        .bind(&search)
        .bind(status)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| InvoiceWithCustomer::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Count invoices matching a query (for pagination)
    pub async fn count_invoices(&self, query: &InvoiceQuery) -> Result<i64, DbError> {
        let search = query
            .search
            .as_deref()
            .map(|s| format!("%{}%", s))
            .unwrap_or_else(|| "%".to_string());
        let status = query.status.as_deref().unwrap_or("%");

        let result = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM invoices i
            JOIN customers c ON c.id = i.customer_id
            WHERE (c.name LIKE ? OR c.email LIKE ?)
              AND i.status LIKE ?
            "#,
        )
        .bind(&search)
        .bind(&search)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.get("count"))
    }

    /// Apply a partial update to an invoice
    pub async fn update_invoice(&self, id: i64, update: UpdateInvoice) -> Result<bool, DbError> {
        let existing = match self.get_invoice_by_id(id).await? {
            Some(invoice) => invoice,
            None => return Ok(false),
        };

        let amount = update.amount_cents.unwrap_or(existing.amount_cents);
        let status = update.status.unwrap_or(existing.status);

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET amount_cents = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(amount)
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an invoice
    pub async fn delete_invoice(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
