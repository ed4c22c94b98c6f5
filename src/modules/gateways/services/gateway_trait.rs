use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{Currency, Money};
use crate::modules::invoices::models::Invoice;

/// Payment gateway capable of charging a customer for an invoice
///
/// Implementations must settle every call into one of the three outcomes;
/// transport or protocol errors whose effect on the customer is unknown are
/// reported as `Unreachable`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempt to move money for the given invoice
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome;

    /// Get gateway name
    fn name(&self) -> &str;
}

/// Charge request data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub amount: Decimal,
    pub currency: Currency,
}

impl ChargeRequest {
    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.id,
            customer_id: invoice.customer_id,
            amount: invoice.amount.value,
            currency: invoice.amount.currency,
        }
    }

    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }
}

/// What happened when the gateway was asked to charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// Money moved
    Paid,

    /// Gateway answered and refused the charge
    Declined { reason: String },

    /// Gateway could not be reached or its answer is unknown
    Unreachable { reason: String },
}

impl ChargeOutcome {
    pub fn declined(reason: impl Into<String>) -> Self {
        ChargeOutcome::Declined {
            reason: reason.into(),
        }
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        ChargeOutcome::Unreachable {
            reason: reason.into(),
        }
    }
}
