// Invoice persistence
//
// Billing depends on `InvoiceRepository` only. The MySQL implementation
// performs status changes as a single conditional UPDATE so two overlapping
// cycles can never both claim the same invoice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::core::{AppError, Currency, Money, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus};

/// Result of a compare-and-set on an invoice status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
    /// The invoice was in the expected status and now holds the new one
    Applied(Invoice),
    /// No invoice with that id exists
    NotFound,
    /// The invoice exists but was not in the expected status
    Conflict { actual: InvoiceStatus },
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Find an invoice by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>>;

    /// All PENDING invoices whose schedule date is at or before `now`, oldest first
    async fn fetch_due_pending(&self, now: DateTime<Utc>) -> Result<Vec<Invoice>>;

    /// All invoices, optionally restricted to one status
    async fn list(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>>;

    /// Atomically move an invoice from `expected` to `next`
    ///
    /// # Arguments
    /// * `id` - Invoice ID
    /// * `expected` - Status the invoice must currently hold
    /// * `next` - Status to write; must be a legal transition from `expected`
    /// * `schedule_date` - New schedule date to write alongside, if any
    ///
    /// # Returns
    /// * `Result<StatusTransition>` - Applied with the updated invoice, NotFound, or Conflict
    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: InvoiceStatus,
        next: InvoiceStatus,
        schedule_date: Option<DateTime<Utc>>,
    ) -> Result<StatusTransition>;
}

/// Reject transitions the state machine doesn't allow before touching storage
pub fn ensure_legal_transition(expected: InvoiceStatus, next: InvoiceStatus) -> Result<()> {
    if expected.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Illegal invoice status transition {} -> {}",
            expected, next
        )))
    }
}

/// MySQL-backed invoice repository
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, customer_id, value, currency, status, due_date, schedule_date
    FROM invoices
"#;

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!("{} WHERE id = ?", SELECT_INVOICE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch invoice: {}", e)))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn fetch_due_pending(&self, now: DateTime<Utc>) -> Result<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} WHERE status = ? AND schedule_date <= ? ORDER BY schedule_date, id",
            SELECT_INVOICE
        ))
        .bind(InvoiceStatus::Pending.as_str())
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch due invoices: {}", e)))?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn list(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, InvoiceRow>(&format!(
                    "{} WHERE status = ? ORDER BY id",
                    SELECT_INVOICE
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, InvoiceRow>(&format!("{} ORDER BY id", SELECT_INVOICE))
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::Internal(format!("Failed to list invoices: {}", e)))?;

        rows.into_iter().map(Invoice::try_from).collect()
    }

    async fn compare_and_set_status(
        &self,
        id: i64,
        expected: InvoiceStatus,
        next: InvoiceStatus,
        schedule_date: Option<DateTime<Utc>>,
    ) -> Result<StatusTransition> {
        ensure_legal_transition(expected, next)?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = ?, schedule_date = COALESCE(?, schedule_date)
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(next.as_str())
        .bind(schedule_date)
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update invoice status: {}", e)))?;

        let current = self.find_by_id(id).await?;

        Ok(match (result.rows_affected(), current) {
            (_, None) => StatusTransition::NotFound,
            (0, Some(invoice)) => StatusTransition::Conflict {
                actual: invoice.status,
            },
            (_, Some(invoice)) => StatusTransition::Applied(invoice),
        })
    }
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: i64,
    customer_id: i64,
    value: Decimal,
    currency: String,
    status: String,
    due_date: DateTime<Utc>,
    schedule_date: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = AppError;

    fn try_from(row: InvoiceRow) -> Result<Self> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid currency in database: {}", e)))?;
        let status: InvoiceStatus = row
            .status
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid status in database: {}", e)))?;

        Ok(Invoice {
            id: row.id,
            customer_id: row.customer_id,
            amount: Money::new(row.value, currency),
            status,
            due_date: row.due_date,
            schedule_date: row.schedule_date,
        })
    }
}
