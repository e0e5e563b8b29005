//! Revenue reporting queries

use sqlx::Row;

use crate::error::DbError;
use crate::models::{DashboardSummary, MonthlyRevenue};
use crate::repository::Database;

impl Database {
    // ==================== Revenue Operations ====================

    /// Monthly totals of paid invoices, oldest month first.
    ///
    /// Month keys come from the leading `YYYY-MM` of the RFC3339
    /// `created_at` column, so no datetime parsing happens in SQL.
    pub async fn monthly_revenue(&self, months: i64) -> Result<Vec<MonthlyRevenue>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT substr(created_at, 1, 7) as month,
                   COALESCE(SUM(amount_cents), 0) as amount_cents
            FROM invoices
            WHERE status = 'paid'
            GROUP BY month
            ORDER BY month DESC
            LIMIT ?
            "#,
        )
        .bind(months)
        .fetch_all(&self.pool)
        .await?;

        let mut revenue: Vec<MonthlyRevenue> = rows
            .iter()
            .map(|row| {
                Ok(MonthlyRevenue {
                    month: row.try_get("month")?,
                    amount_cents: row.try_get("amount_cents")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()?;

        revenue.reverse();
        Ok(revenue)
    }

    /// Aggregates backing the dashboard cards
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, DbError> {
        let invoices = sqlx::query(
            r#"
            SELECT
                COUNT(*) as invoice_count,
                COALESCE(SUM(CASE WHEN status = 'paid' THEN amount_cents ELSE 0 END), 0) as paid_cents,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN amount_cents ELSE 0 END), 0) as pending_cents
            FROM invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let customer_count = self.customer_count().await?;

        Ok(DashboardSummary {
            invoice_count: invoices.get("invoice_count"),
            customer_count,
            paid_cents: invoices.get("paid_cents"),
            pending_cents: invoices.get("pending_cents"),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{InvoiceStatus, NewCustomer, NewInvoice};
    use crate::repository::Database;

    async fn test_db() -> (Database, tempfile::NamedTempFile) {
        let file = tempfile::NamedTempFile::new().unwrap();
        let url = format!("sqlite:{}?mode=rwc", file.path().display());
        let db = Database::new(&url).await.unwrap();
        (db, file)
    }

    #[tokio::test]
    async fn test_dashboard_summary_and_revenue() {
        let (db, _file) = test_db().await;

        let customer = db
            .insert_customer(NewCustomer {
                name: "Acme".to_string(),
                email: "billing@acme.test".to_string(),
                image_url: None,
            })
            .await
            .unwrap();

        db.insert_invoice(NewInvoice {
            customer_id: customer.id,
            amount_cents: 12_500,
            status: InvoiceStatus::Paid,
        })
        .await
        .unwrap();
        db.insert_invoice(NewInvoice {
            customer_id: customer.id,
            amount_cents: 4_000,
            status: InvoiceStatus::Pending,
        })
        .await
        .unwrap();

        let summary = db.dashboard_summary().await.unwrap();
        assert_eq!(summary.invoice_count, 2);
        assert_eq!(summary.customer_count, 1);
        assert_eq!(summary.paid_cents, 12_500);
        assert_eq!(summary.pending_cents, 4_000);

        let revenue = db.monthly_revenue(12).await.unwrap();
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].amount_cents, 12_500);
        // Month key is the YYYY-MM prefix of the insertion timestamp
        assert_eq!(revenue[0].month.len(), 7);
    }

    #[tokio::test]
    async fn test_invoice_requires_existing_customer() {
        let (db, _file) = test_db().await;

        let result = db
            .insert_invoice(NewInvoice {
                customer_id: 999,
                amount_cents: 100,
                status: InvoiceStatus::Pending,
            })
            .await;
        assert!(matches!(result, Err(crate::error::DbError::NotFound(_))));
    }
}
