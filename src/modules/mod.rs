pub mod billing;
pub mod customers;
pub mod gateways;
pub mod invoices;
