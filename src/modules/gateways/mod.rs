pub mod services;

pub use services::{ChargeOutcome, ChargeRequest, HttpPaymentGateway, PaymentGateway};
