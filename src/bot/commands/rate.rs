//! Exchange rate Discord commands - `/rate record|show`.
//! Rates are reference data only; invoice totals are never converted.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, report_failure},
        core::{exchange_rate, parse_decimal},
        errors::{Error, Result},
    };
    use chrono::NaiveDate;

    /// Parent command for exchange rates.
    #[poise::command(slash_command, subcommands("rate_record", "rate_show"))]
    pub async fn rate(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say(
            "Exchange rate command. Available subcommands:\n\
            `/rate record` - Record a rate effective from a date\n\
            `/rate show` - Show the rate in effect on a date",
        )
        .await?;
        Ok(())
    }

    /// Records how many units of `to` one unit of `from` buys, effective from a date.
    #[poise::command(slash_command, rename = "record")]
    pub async fn rate_record(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Source currency (e.g., EUR)"] from: String,
        #[description = "Target currency (e.g., CHF)"] to: String,
        #[description = "Units of target per unit of source (e.g., 0.9612)"] rate: String,
        #[description = "Effective from (YYYY-MM-DD, default today)"] date: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let parsed = parse_date(date.as_deref())
            .and_then(|effective_on| Ok((effective_on, parse_decimal(&rate)?)));
        let (effective_on, rate) = match parsed {
            Ok(values) => values,
            Err(e) => return report_failure(ctx, "record the rate", e).await,
        };

        match exchange_rate::record_exchange_rate(db, effective_on, &from, &to, rate).await {
            Ok(saved) => {
                ctx.say(format!(
                    "✅ From {}: 1 {} = {} {}.",
                    saved.effective_on, saved.from_currency, saved.rate, saved.to_currency
                ))
                .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "record the rate", e).await,
        }
    }

    /// Shows the rate in effect on a date.
    #[poise::command(slash_command, rename = "show")]
    pub async fn rate_show(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Source currency (e.g., EUR)"] from: String,
        #[description = "Target currency (e.g., CHF)"] to: String,
        #[description = "Date (YYYY-MM-DD, default today)"] date: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let on = match parse_date(date.as_deref()) {
            Ok(on) => on,
            Err(e) => return report_failure(ctx, "look up the rate", e).await,
        };

        match exchange_rate::get_exchange_rate(db, &from, &to, on).await {
            Ok(Some(found)) => {
                ctx.say(format!(
                    "1 {} = {} {} (effective from {}).",
                    found.from_currency, found.rate, found.to_currency, found.effective_on
                ))
                .await?;
                Ok(())
            }
            Ok(None) => {
                ctx.say(format!(
                    "No rate from {} to {} recorded on or before {on}.",
                    from.trim().to_uppercase(),
                    to.trim().to_uppercase()
                ))
                .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "look up the rate", e).await,
        }
    }

    fn parse_date(raw: Option<&str>) -> Result<NaiveDate> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => {
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| Error::Validation {
                    message: format!("'{text}' is not a date (YYYY-MM-DD): {e}"),
                })
            }
            None => Ok(chrono::Local::now().date_naive()),
        }
    }
}

// Re-export all commands
pub use inner::*;
