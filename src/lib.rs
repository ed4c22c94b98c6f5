//! Billrun recurring invoice billing
//!
//! Charges due invoices once per day through a payment gateway, moving each
//! invoice through PENDING -> PROCESSING -> PAID/FAILED (or back to PENDING
//! when the gateway can't be reached).

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::billing;
pub use modules::customers;
pub use modules::gateways;
pub use modules::invoices;

use actix_web::web;

/// Mount the read-only query routes under `/rest/v1`
pub fn configure_rest(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rest/v1")
            .configure(invoices::controllers::configure)
            .configure(customers::controllers::configure),
    );
}

/// Liveness probe
pub async fn health_check() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "billrun"
    }))
}
