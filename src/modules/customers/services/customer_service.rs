use std::sync::Arc;

use crate::core::{AppError, Result};
use crate::modules::customers::models::Customer;
use crate::modules::customers::repositories::CustomerRepository;

/// Read-side access to customers for operators
pub struct CustomerService {
    repository: Arc<dyn CustomerRepository>,
}

impl CustomerService {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self { repository }
    }

    pub async fn fetch(&self, id: i64) -> Result<Customer> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer {}", id)))
    }

    pub async fn fetch_all(&self) -> Result<Vec<Customer>> {
        self.repository.list().await
    }
}
