//! Core business logic - framework-agnostic customer, template and invoice operations.
//!
//! Nothing in here knows about Discord; the bot layer collects input, calls these
//! functions and formats their results.

/// Customer management
pub mod customer;
/// Per-line invoice drafts and the compact line syntax
pub mod draft;
/// Exchange rate storage
pub mod exchange_rate;
/// Invoice assembly and numbering
pub mod invoice;
/// Seeding customers and templates from config.toml
pub mod seed;
/// Position template management
pub mod template;

use crate::errors::{Error, Result};
use rust_decimal::Decimal;

/// Currency used when the operator leaves the field blank
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Trims and upper-cases a currency code, blank input becomes [`DEFAULT_CURRENCY`].
#[must_use]
pub fn normalize_currency(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_CURRENCY.to_string()
    } else {
        trimmed.to_uppercase()
    }
}

/// Trims optional text, blank input becomes `None`.
#[must_use]
pub fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses an exact decimal from operator input, accepting a decimal comma.
///
/// # Errors
/// Returns `Error::Validation` if the text is not a decimal number.
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().replace(',', ".");
    cleaned.parse::<Decimal>().map_err(|_| Error::Validation {
        message: format!("'{}' is not a valid number", raw.trim()),
    })
}

/// Rejects negative values.
pub(crate) fn ensure_non_negative(amount: Decimal) -> Result<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}
