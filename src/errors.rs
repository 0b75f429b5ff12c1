//! Unified error type for `InvoiceBuddy`.
//!
//! Domain failures use struct variants so callers (and tests) can match on the
//! offending value; infrastructure failures wrap their source error.

use rust_decimal::Decimal;
use thiserror::Error;

/// Every failure the crate can surface to an operator.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Operator input was rejected before touching storage
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A quantity, price or rate is outside its allowed range
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected value
        amount: Decimal,
    },

    /// Year or month do not form a valid billing period
    #[error("Invalid billing period: year {year}, month {month}")]
    InvalidPeriod {
        /// Requested year
        year: i32,
        /// Requested month
        month: u32,
    },

    /// No customer with the given id or name
    #[error("Customer not found: {name}")]
    CustomerNotFound {
        /// Id or name used for the lookup
        name: String,
    },

    /// No position template with the given id or name
    #[error("Position template not found: {name}")]
    TemplateNotFound {
        /// Id or name used for the lookup
        name: String,
    },

    /// No invoice with the given number
    #[error("Invoice not found: {number}")]
    InvoiceNotFound {
        /// Invoice number used for the lookup
        number: String,
    },

    /// The customer is still referenced by invoices
    #[error("Customer '{name}' has {count} invoice(s) and cannot be deleted")]
    CustomerHasInvoices {
        /// Customer display name
        name: String,
        /// Number of referencing invoices
        count: u64,
    },

    /// Every attempt to allocate an invoice number hit an existing number
    #[error("Could not allocate a unique invoice number after {attempts} attempts (last tried {number})")]
    NumberConflict {
        /// The last number that collided
        number: String,
        /// How many attempts were made
        attempts: u32,
    },

    /// The latest invoice number is numeric but cannot be incremented
    #[error("Invoice number '{number}' cannot be incremented")]
    NumberExhausted {
        /// The number that overflowed
        number: String,
    },

    /// Decimal arithmetic overflowed while computing a total
    #[error("Amount overflow while computing the invoice total")]
    AmountOverflow,

    /// The document layout is missing or malformed, or PDF encoding failed
    #[error("Render error: {message}")]
    Render {
        /// What went wrong
        message: String,
    },

    /// Any storage-layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File-system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<tera::Error> for Error {
    fn from(value: tera::Error) -> Self {
        // tera nests the interesting part (line/column) in the source chain
        let mut message = value.to_string();
        let mut source = std::error::Error::source(&value);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Render { message }
    }
}

impl From<lopdf::Error> for Error {
    fn from(value: lopdf::Error) -> Self {
        Self::Render {
            message: format!("PDF encoding failed: {value}"),
        }
    }
}

impl Error {
    /// Whether the error describes a problem with the operator's request, as opposed
    /// to an infrastructure failure that should be logged.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Io(_) | Self::EnvVar(_) | Self::Framework(_) | Self::Config { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
