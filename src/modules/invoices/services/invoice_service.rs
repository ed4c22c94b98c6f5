use std::sync::Arc;

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus};
use crate::modules::invoices::repositories::InvoiceRepository;

/// Read-side access to invoices for operators
pub struct InvoiceService {
    repository: Arc<dyn InvoiceRepository>,
}

impl InvoiceService {
    pub fn new(repository: Arc<dyn InvoiceRepository>) -> Self {
        Self { repository }
    }

    /// Fetch an invoice, failing with `NotFound` if it doesn't exist
    pub async fn fetch(&self, id: i64) -> Result<Invoice> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", id)))
    }

    /// List invoices, optionally filtered by status
    pub async fn fetch_all(&self, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>> {
        self.repository.list(status).await
    }
}
