pub mod billing_service;
pub mod scheduler;

pub use billing_service::BillingService;
pub use scheduler::{BillingCycle, Scheduler};
