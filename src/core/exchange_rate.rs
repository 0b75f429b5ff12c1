//! Exchange rate storage.
//!
//! Rates are kept for reference when quoting foreign-currency positions; totals are
//! never converted. A pair has at most one rate per day, recording it again replaces
//! the rate for that day.

use crate::{
    core::normalize_currency,
    entities::{ExchangeRate, exchange_rate},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

fn currency_pair(from: &str, to: &str) -> Result<(String, String)> {
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(Error::Validation {
            message: "Both currencies of an exchange rate are required".to_string(),
        });
    }
    let from = normalize_currency(from);
    let to = normalize_currency(to);
    for code in [&from, &to] {
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::Validation {
                message: format!("'{code}' is not a three-letter currency code"),
            });
        }
    }
    if from == to {
        return Err(Error::Validation {
            message: format!("Exchange rate from {from} to itself is always 1"),
        });
    }
    Ok((from, to))
}

/// Records the rate for a currency pair, effective from `effective_on`.
///
/// # Errors
/// Returns `Error::InvalidAmount` unless `rate > 0`, `Error::Validation` for a blank
/// or identical currency pair, or a database error.
#[instrument(skip(db))]
pub async fn record_exchange_rate(
    db: &DatabaseConnection,
    effective_on: Date,
    from_currency: &str,
    to_currency: &str,
    rate: Decimal,
) -> Result<exchange_rate::Model> {
    if rate <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount: rate });
    }
    let (from, to) = currency_pair(from_currency, to_currency)?;

    let existing = ExchangeRate::find()
        .filter(exchange_rate::Column::EffectiveOn.eq(effective_on))
        .filter(exchange_rate::Column::FromCurrency.eq(from.as_str()))
        .filter(exchange_rate::Column::ToCurrency.eq(to.as_str()))
        .one(db)
        .await?;

    let saved = if let Some(existing) = existing {
        let mut active: exchange_rate::ActiveModel = existing.into();
        active.rate = Set(rate.into());
        active.update(db).await?
    } else {
        exchange_rate::ActiveModel {
            effective_on: Set(effective_on),
            from_currency: Set(from),
            to_currency: Set(to),
            rate: Set(rate.into()),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    info!(
        from = %saved.from_currency,
        to = %saved.to_currency,
        rate = %saved.rate,
        "Exchange rate recorded"
    );
    Ok(saved)
}

/// Finds the rate in effect on `on`: the latest one recorded on or before that day.
pub async fn get_exchange_rate(
    db: &DatabaseConnection,
    from_currency: &str,
    to_currency: &str,
    on: Date,
) -> Result<Option<exchange_rate::Model>> {
    let (from, to) = currency_pair(from_currency, to_currency)?;
    ExchangeRate::find()
        .filter(exchange_rate::Column::FromCurrency.eq(from))
        .filter(exchange_rate::Column::ToCurrency.eq(to))
        .filter(exchange_rate::Column::EffectiveOn.lte(on))
        .order_by_desc(exchange_rate::Column::EffectiveOn)
        .order_by_desc(exchange_rate::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every recorded rate, newest first.
pub async fn list_exchange_rates(db: &DatabaseConnection) -> Result<Vec<exchange_rate::Model>> {
    ExchangeRate::find()
        .order_by_desc(exchange_rate::Column::EffectiveOn)
        .order_by_asc(exchange_rate::Column::FromCurrency)
        .order_by_asc(exchange_rate::Column::ToCurrency)
        .all(db)
        .await
        .map_err(Into::into)
}
