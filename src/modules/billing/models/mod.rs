mod outcome;

pub use outcome::{BillingError, CycleSummary, FailureClass, InvoiceOutcome};
