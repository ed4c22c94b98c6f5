use serde::{Deserialize, Serialize};

use crate::core::Currency;

/// A billed customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    /// Charges against this customer must be denominated in this currency
    pub currency: Currency,
}

impl Customer {
    pub fn new(id: i64, currency: Currency) -> Self {
        Self { id, currency }
    }
}
