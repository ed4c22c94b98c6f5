use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::modules::invoices::models::InvoiceStatus;
use crate::modules::invoices::services::InvoiceService;

/// Query parameters for listing invoices
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
}

impl ListInvoicesQuery {
    /// Parse the optional status filter; unknown values are a client error
    pub fn status_filter(&self) -> Result<Option<InvoiceStatus>, AppError> {
        self.status
            .as_deref()
            .map(|raw| raw.trim().to_uppercase().parse().map_err(AppError::Validation))
            .transpose()
    }
}

/// List invoices
/// GET /rest/v1/invoices[?status=PENDING]
pub async fn list_invoices(
    service: web::Data<Arc<InvoiceService>>,
    query: web::Query<ListInvoicesQuery>,
) -> Result<HttpResponse, AppError> {
    let status = query.status_filter()?;
    let invoices = service.fetch_all(status).await?;

    Ok(HttpResponse::Ok().json(invoices))
}

/// Get invoice by ID
/// GET /rest/v1/invoices/{id}
pub async fn get_invoice(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.fetch(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(invoice))
}

/// Configure invoice routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invoices")
            .route("", web::get().to(list_invoices))
            .route("/{id}", web::get().to(get_invoice)),
    );
}
