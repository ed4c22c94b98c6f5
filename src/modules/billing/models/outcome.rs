// Per-invoice results of a billing cycle.
//
// Every workflow step reports through these types. One invoice's outcome
// never aborts its siblings.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::{AppError, Currency};
use crate::modules::invoices::models::InvoiceStatus;

/// Whether retrying on a later cycle can help
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// Why an invoice did not end up PAID
#[derive(thiserror::Error, Debug)]
pub enum BillingError {
    #[error("Invoice {0} not found")]
    InvoiceNotFound(i64),

    #[error("Customer {customer_id} of invoice {invoice_id} not found")]
    CustomerNotFound { invoice_id: i64, customer_id: i64 },

    #[error("Invoice {invoice_id} is billed in {invoice_currency} but customer {customer_id} pays in {customer_currency}")]
    CurrencyMismatch {
        invoice_id: i64,
        customer_id: i64,
        invoice_currency: Currency,
        customer_currency: Currency,
    },

    #[error("Payment gateway unreachable for invoice {invoice_id}: {reason}")]
    Unreachable { invoice_id: i64, reason: String },

    #[error("Charge for invoice {invoice_id} declined: {reason}")]
    Declined { invoice_id: i64, reason: String },

    /// Storage failed while the invoice was still PENDING
    #[error("Store error for invoice {invoice_id}: {source}")]
    Store {
        invoice_id: i64,
        #[source]
        source: AppError,
    },

    /// Storage failed during the PENDING -> PROCESSING claim; the write may have landed
    #[error("Claim of invoice {invoice_id} unconfirmed: {source}")]
    Claim {
        invoice_id: i64,
        #[source]
        source: AppError,
    },

    /// The move out of PROCESSING failed or could not be confirmed
    #[error("Invoice {invoice_id} could not be confirmed as {intended}: {detail}")]
    Finalize {
        invoice_id: i64,
        intended: InvoiceStatus,
        detail: String,
    },
}

impl BillingError {
    pub fn invoice_id(&self) -> i64 {
        match self {
            BillingError::InvoiceNotFound(invoice_id) => *invoice_id,
            BillingError::CustomerNotFound { invoice_id, .. }
            | BillingError::CurrencyMismatch { invoice_id, .. }
            | BillingError::Unreachable { invoice_id, .. }
            | BillingError::Declined { invoice_id, .. }
            | BillingError::Store { invoice_id, .. }
            | BillingError::Claim { invoice_id, .. }
            | BillingError::Finalize { invoice_id, .. } => *invoice_id,
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            BillingError::Unreachable { .. } | BillingError::Store { .. } => FailureClass::Transient,
            BillingError::InvoiceNotFound(_)
            | BillingError::CustomerNotFound { .. }
            | BillingError::CurrencyMismatch { .. }
            | BillingError::Declined { .. }
            | BillingError::Claim { .. }
            | BillingError::Finalize { .. } => FailureClass::Permanent,
        }
    }

    /// An operator has to look at the invoice; billing won't resolve it alone
    pub fn requires_manual_intervention(&self) -> bool {
        matches!(
            self,
            BillingError::InvoiceNotFound(_)
                | BillingError::CustomerNotFound { .. }
                | BillingError::Declined { .. }
                | BillingError::Claim { .. }
                | BillingError::Finalize { .. }
        )
    }
}

/// How one invoice's workflow ended
#[derive(Debug)]
pub enum InvoiceOutcome {
    /// Charged and marked PAID
    Paid,

    /// Back to PENDING, retried once `schedule_date` passes
    Rescheduled {
        schedule_date: DateTime<Utc>,
        cause: BillingError,
    },

    /// Marked FAILED
    Failed(BillingError),

    /// Invoice wasn't PENDING when re-read; left alone
    Skipped { status: InvoiceStatus },

    /// Invoice or customer missing; nothing changed
    NotFound(BillingError),

    /// Storage trouble; see the error for whether the invoice was left claimed
    Errored(BillingError),
}

impl InvoiceOutcome {
    pub fn error(&self) -> Option<&BillingError> {
        match self {
            InvoiceOutcome::Paid | InvoiceOutcome::Skipped { .. } => None,
            InvoiceOutcome::Rescheduled { cause, .. } => Some(cause),
            InvoiceOutcome::Failed(e) | InvoiceOutcome::NotFound(e) | InvoiceOutcome::Errored(e) => {
                Some(e)
            }
        }
    }
}

/// Tally of one cycle, used for the completion log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub candidates: usize,
    pub paid: usize,
    pub rescheduled: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub errored: usize,
}

impl CycleSummary {
    pub fn new(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            candidates: 0,
            paid: 0,
            rescheduled: 0,
            failed: 0,
            skipped: 0,
            not_found: 0,
            errored: 0,
        }
    }

    pub fn record(&mut self, outcome: &InvoiceOutcome) {
        match outcome {
            InvoiceOutcome::Paid => self.paid += 1,
            InvoiceOutcome::Rescheduled { .. } => self.rescheduled += 1,
            InvoiceOutcome::Failed(_) => self.failed += 1,
            InvoiceOutcome::Skipped { .. } => self.skipped += 1,
            InvoiceOutcome::NotFound(_) => self.not_found += 1,
            InvoiceOutcome::Errored(_) => self.errored += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.paid + self.rescheduled + self.failed + self.skipped + self.not_found + self.errored
    }
}
