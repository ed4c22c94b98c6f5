use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};

use crate::core::{AppError, Currency, Result};
use crate::modules::customers::models::Customer;

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Find a customer by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>>;

    /// All customers ordered by id
    async fn list(&self) -> Result<Vec<Customer>>;
}

/// MySQL-backed customer repository
pub struct MySqlCustomerRepository {
    pool: MySqlPool,
}

impl MySqlCustomerRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for MySqlCustomerRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>("SELECT id, currency FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch customer: {}", e)))?;

        row.map(Customer::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>("SELECT id, currency FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list customers: {}", e)))?;

        rows.into_iter().map(Customer::try_from).collect()
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: i64,
    currency: String,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = AppError;

    fn try_from(row: CustomerRow) -> Result<Self> {
        let currency: Currency = row
            .currency
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid currency in database: {}", e)))?;

        Ok(Customer::new(row.id, currency))
    }
}
