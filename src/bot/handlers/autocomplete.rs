//! Autocomplete handlers for Discord slash command parameters.
//!
//! Customer names need not be unique, so customer suggestions carry the id as
//! `Name (ID n)`; [`parse_labeled_id`] reads it back when the command runs.
//! Template names are unique enough to be suggested as-is.

use crate::{
    bot::BotData,
    core::{customer, template},
    errors::Error,
};

/// Discord shows at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;

/// Formats a customer suggestion.
#[must_use]
pub fn customer_label(name: &str, id: i64) -> String {
    format!("{name} (ID {id})")
}

/// Extracts the id from a `Name (ID n)` label produced by [`customer_label`].
#[must_use]
pub fn parse_labeled_id(label: &str) -> Option<i64> {
    let inner = label.trim().strip_suffix(')')?;
    let (_, id) = inner.rsplit_once("(ID ")?;
    id.trim().parse().ok()
}

/// Provides autocomplete suggestions for customers.
pub async fn autocomplete_customer(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(customers) = customer::get_all_customers(db).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();

    // Already sorted by name
    customers
        .into_iter()
        .filter(|c| c.name.to_lowercase().contains(&partial_lower))
        .map(|c| customer_label(&c.name, c.id))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Provides autocomplete suggestions for position template names.
pub async fn autocomplete_template(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(templates) = template::get_all_templates(db).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();

    templates
        .into_iter()
        .filter(|t| t.name.to_lowercase().contains(&partial_lower))
        .map(|t| t.name)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Provides autocomplete suggestions for billing periods of existing invoices.
pub async fn autocomplete_period(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(invoices) = crate::core::invoice::list_invoices(db, None).await else {
        return Vec::new();
    };

    let mut periods: Vec<String> = invoices
        .into_iter()
        .map(|inv| inv.period)
        .filter(|period| period.starts_with(partial.trim()))
        .collect();
    periods.sort_unstable_by(|a, b| b.cmp(a));
    periods.dedup();
    periods.truncate(MAX_SUGGESTIONS);
    periods
}
