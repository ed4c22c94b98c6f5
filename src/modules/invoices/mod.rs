// Invoices module

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Invoice, InvoiceStatus};
pub use repositories::{InvoiceRepository, MySqlInvoiceRepository, StatusTransition};
pub use services::InvoiceService;
