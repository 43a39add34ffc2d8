pub mod currency;
pub mod error;

pub use currency::{AmountRule, Currency};
pub use error::{ErrorKind, HarnessError, Result};
