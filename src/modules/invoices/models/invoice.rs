// Invoice model and the status state machine.
//
// Invoices are created PENDING by an external process and only ever mutated by
// the billing cycle. PAID and FAILED are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Currency, Money};

/// Invoice status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Awaiting a charge attempt once `schedule_date` has passed
    Pending,

    /// A billing cycle has claimed the invoice and is charging it
    Processing,

    /// Charge succeeded
    Paid,

    /// Charge can never succeed (currency mismatch or gateway decline)
    Failed,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Processing,
        InvoiceStatus::Paid,
        InvoiceStatus::Failed,
    ];

    /// No automatic transition ever leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Failed)
    }

    /// Legal transitions:
    ///
    /// ```text
    /// PENDING ──► PROCESSING ──► PAID
    ///    ▲             │
    ///    └─────────────┼──────► FAILED
    ///   (reschedule)   │
    /// ```
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;

        matches!(
            (self, next),
            (Pending, Processing) | (Processing, Paid) | (Processing, Failed) | (Processing, Pending)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Processing => "PROCESSING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PROCESSING" => Ok(InvoiceStatus::Processing),
            "PAID" => Ok(InvoiceStatus::Paid),
            "FAILED" => Ok(InvoiceStatus::Failed),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// An invoice owed by a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub customer_id: i64,
    pub amount: Money,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    /// Earliest moment a charge may be attempted
    pub schedule_date: DateTime<Utc>,
}

impl Invoice {
    /// New invoice scheduled on its due date
    pub fn pending(id: i64, customer_id: i64, amount: Money, due_date: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id,
            amount,
            status: InvoiceStatus::Pending,
            due_date,
            schedule_date: due_date,
        }
    }

    /// Whether a cycle running at `now` may attempt this invoice
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.status == InvoiceStatus::Pending && self.schedule_date <= now
    }

    pub fn currency(&self) -> Currency {
        self.amount.currency
    }
}
