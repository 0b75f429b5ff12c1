//! Shared test utilities for `InvoiceBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        customer::{self, CustomerInput},
        invoice::{self, AssembledInvoice, LineItemInput},
        template::{self, TemplateInput},
    },
    entities,
    errors::Result,
    migration::Migrator,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

/// Creates an in-memory `SQLite` database with all migrations applied.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Creates a test customer with sensible defaults.
///
/// # Defaults
/// * `address`: "Teststraße 1, 12345 Teststadt"
/// * `default_currency`: "EUR"
/// * no registry, VAT or tax numbers
pub async fn create_test_customer(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::customer::Model> {
    create_custom_customer(db, name, "EUR").await
}

/// Creates a test customer billed in a specific currency.
pub async fn create_custom_customer(
    db: &DatabaseConnection,
    name: &str,
    currency: &str,
) -> Result<entities::customer::Model> {
    customer::create_customer(
        db,
        CustomerInput {
            name: name.to_string(),
            address: "Teststraße 1, 12345 Teststadt".to_string(),
            default_currency: currency.to_string(),
            ..Default::default()
        },
    )
    .await
}

/// Builds an unsaved customer model, for tests that must not touch storage.
#[must_use]
pub fn customer_model(id: i64, name: &str) -> entities::customer::Model {
    let now = Utc::now();
    entities::customer::Model {
        id,
        uuid: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        name: name.to_string(),
        address: "Teststraße 1, 12345 Teststadt".to_string(),
        default_currency: "EUR".to_string(),
        company_number: None,
        vat_number: None,
        tax_number: None,
    }
}

/// Creates a test position template.
///
/// # Defaults
/// * `description`: "`<name>` services"
/// * `default_quantity`: 1
/// * `unit_price`: 100.00 EUR
pub async fn create_test_template(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::position_template::Model> {
    template::create_template(
        db,
        TemplateInput {
            name: name.to_string(),
            description: format!("{name} services"),
            default_quantity: Decimal::ONE,
            unit_price: Decimal::new(10000, 2),
            currency: "EUR".to_string(),
            attachment_path: None,
        },
    )
    .await
}

/// Assembles a March 2024 invoice with a single 10 x 150.00 position.
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    customer: &entities::customer::Model,
) -> Result<AssembledInvoice> {
    invoice::assemble_invoice(
        db,
        customer,
        2024,
        3,
        &[LineItemInput {
            description: "Consulting".to_string(),
            quantity: Decimal::TEN,
            unit_price: Decimal::new(15000, 2),
            currency: "EUR".to_string(),
            attachment_path: None,
        }],
    )
    .await
}

/// Inserts an invoice header directly, bypassing numbering.
/// Use this to simulate numbers written by another tool.
pub async fn insert_raw_invoice(
    db: &DatabaseConnection,
    customer: &entities::customer::Model,
    number: &str,
) -> Result<entities::invoice::Model> {
    entities::invoice::ActiveModel {
        number: Set(number.to_string()),
        period: Set("2024-01".to_string()),
        customer_id: Set(customer.id),
        total: Set(Some(Decimal::ZERO.into())),
        currency: Set(customer.default_currency.clone()),
        status: Set(entities::InvoiceStatus::Sent),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
