//! Seeds customers and position templates listed in config.toml.
//!
//! Seeding runs on every start. Entries whose name already exists are left alone,
//! so edits made through the bot are never overwritten by the file.

use crate::{
    config::settings::Settings,
    core::{customer::CustomerInput, template::TemplateInput},
    entities::{Customer, PositionTemplate, customer, position_template},
    errors::Result,
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// How many rows a seeding run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Customers inserted
    pub customers_created: usize,
    /// Position templates inserted
    pub templates_created: usize,
}

/// Inserts the configured customers and templates that do not exist yet.
///
/// All inserts happen in one transaction; an invalid entry aborts the whole run.
///
/// # Errors
/// Returns a validation error for an invalid entry, or a database error.
#[instrument(skip_all, fields(customers = settings.customers.len(), templates = settings.templates.len()))]
pub async fn seed_from_config(db: &DatabaseConnection, settings: &Settings) -> Result<SeedReport> {
    let txn = db.begin().await?;
    let mut report = SeedReport::default();

    let mut customer_names: HashSet<String> = Customer::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    for entry in &settings.customers {
        let input = CustomerInput {
            name: entry.name.clone(),
            address: entry.address.clone(),
            default_currency: entry.default_currency.clone(),
            company_number: entry.company_number.clone(),
            vat_number: entry.vat_number.clone(),
            tax_number: entry.tax_number.clone(),
        }
        .normalized()?;

        if customer_names.contains(&input.name) {
            debug!(name = %input.name, "Customer already exists, skipping");
            continue;
        }

        info!(name = %input.name, "Seeding customer");
        customer_names.insert(input.name.clone());
        customer::ActiveModel {
            name: Set(input.name),
            address: Set(input.address),
            default_currency: Set(input.default_currency),
            company_number: Set(input.company_number),
            vat_number: Set(input.vat_number),
            tax_number: Set(input.tax_number),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        report.customers_created += 1;
    }

    // Template names are matched case-insensitively, like the lookup does
    let mut template_names: HashSet<String> = PositionTemplate::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|t| t.name.to_lowercase())
        .collect();

    for entry in &settings.templates {
        let input = TemplateInput {
            name: entry.name.clone(),
            description: entry.description.clone(),
            default_quantity: entry.default_quantity,
            unit_price: entry.unit_price,
            currency: entry.currency.clone(),
            attachment_path: entry.attachment_path.clone(),
        }
        .normalized()?;

        if !template_names.insert(input.name.to_lowercase()) {
            debug!(name = %input.name, "Position template already exists, skipping");
            continue;
        }

        info!(name = %input.name, "Seeding position template");
        position_template::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            default_quantity: Set(input.default_quantity.into()),
            unit_price: Set(input.unit_price.into()),
            currency: Set(input.currency),
            attachment_path: Set(input.attachment_path),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        report.templates_created += 1;
    }

    txn.commit().await?;
    info!(
        customers_created = report.customers_created,
        templates_created = report.templates_created,
        "Seeding finished"
    );
    Ok(report)
}
