pub mod clock;
pub mod currency;
pub mod error;

pub use clock::{Clock, SystemClock};
pub use currency::{Currency, Money};
pub use error::{AppError, Result};
