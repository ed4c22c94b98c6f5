mod invoice;

pub use invoice::{Invoice, InvoiceStatus};
