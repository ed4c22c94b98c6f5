// Billing module: per-cycle orchestration and the daily scheduler

pub mod models;
pub mod services;

pub use models::{BillingError, CycleSummary, FailureClass, InvoiceOutcome};
pub use services::{BillingCycle, BillingService, Scheduler};
