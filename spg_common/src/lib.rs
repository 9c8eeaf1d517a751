//! Types shared between the store payment engine and the server.
mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{normalize_currency_code, Money, MoneyConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
