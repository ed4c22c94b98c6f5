use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::modules::customers::services::CustomerService;

/// List customers
/// GET /rest/v1/customers
pub async fn list_customers(
    service: web::Data<Arc<CustomerService>>,
) -> Result<HttpResponse, AppError> {
    let customers = service.fetch_all().await?;

    Ok(HttpResponse::Ok().json(customers))
}

/// Get customer by ID
/// GET /rest/v1/customers/{id}
pub async fn get_customer(
    service: web::Data<Arc<CustomerService>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let customer = service.fetch(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(customer))
}

/// Configure customer routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customers")
            .route("", web::get().to(list_customers))
            .route("/{id}", web::get().to(get_customer)),
    );
}
