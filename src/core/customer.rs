//! Customer business logic - Handles creating, editing and deleting customers.
//!
//! Customers are managed independently of invoicing. A customer that is still
//! referenced by an invoice cannot be deleted; the foreign key guards the same rule
//! at the storage level.

use crate::{
    core::{normalize_currency, optional_text},
    entities::{Customer, Invoice, customer, invoice},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Operator input for creating or editing a customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerInput {
    /// Display name / company name (required)
    pub name: String,
    /// Postal address (required)
    pub address: String,
    /// Currency for new invoices, blank means `EUR`
    pub default_currency: String,
    /// Trade registry number
    pub company_number: Option<String>,
    /// VAT identification number
    pub vat_number: Option<String>,
    /// Tax number
    pub tax_number: Option<String>,
}

impl CustomerInput {
    /// Trims all fields and rejects blank name or address.
    pub(crate) fn normalized(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation {
                message: "Customer name cannot be empty".to_string(),
            });
        }

        let address = self.address.trim().to_string();
        if address.is_empty() {
            return Err(Error::Validation {
                message: "Customer address cannot be empty".to_string(),
            });
        }

        Ok(Self {
            name,
            address,
            default_currency: normalize_currency(&self.default_currency),
            company_number: optional_text(self.company_number),
            vat_number: optional_text(self.vat_number),
            tax_number: optional_text(self.tax_number),
        })
    }
}

/// Retrieves all customers ordered alphabetically by name.
pub async fn get_all_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>> {
    Customer::find()
        .order_by_asc(customer::Column::Name)
        .order_by_asc(customer::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a customer by its id.
pub async fn get_customer_by_id<C>(db: &C, customer_id: i64) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the first customer with exactly this name.
pub async fn get_customer_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<customer::Model>> {
    Customer::find()
        .filter(customer::Column::Name.eq(name.trim()))
        .order_by_asc(customer::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a customer after validating the input.
///
/// # Errors
/// Returns `Error::Validation` for a blank name or address, or a database error.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_customer(db: &DatabaseConnection, input: CustomerInput) -> Result<customer::Model> {
    let input = input.normalized()?;

    let customer = customer::ActiveModel {
        name: Set(input.name),
        address: Set(input.address),
        default_currency: Set(input.default_currency),
        company_number: Set(input.company_number),
        vat_number: Set(input.vat_number),
        tax_number: Set(input.tax_number),
        ..Default::default()
    };

    let created = customer.insert(db).await?;
    info!(customer_id = created.id, "Customer created");
    Ok(created)
}

/// Replaces all editable fields of an existing customer.
///
/// # Errors
/// Returns `Error::Validation` for invalid input, `Error::CustomerNotFound` if the
/// customer does not exist, or a database error.
#[instrument(skip(db, input))]
pub async fn update_customer(
    db: &DatabaseConnection,
    customer_id: i64,
    input: CustomerInput,
) -> Result<customer::Model> {
    let input = input.normalized()?;

    let mut customer: customer::ActiveModel = Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            name: customer_id.to_string(),
        })?
        .into();

    customer.name = Set(input.name);
    customer.address = Set(input.address);
    customer.default_currency = Set(input.default_currency);
    customer.company_number = Set(input.company_number);
    customer.vat_number = Set(input.vat_number);
    customer.tax_number = Set(input.tax_number);

    customer.update(db).await.map_err(Into::into)
}

/// Deletes a customer that has no invoices.
///
/// The invoice count and the delete run in one transaction, so a refused delete
/// leaves the customer and its invoices untouched.
///
/// # Errors
/// Returns `Error::CustomerNotFound`, `Error::CustomerHasInvoices`, or a database
/// error (including a foreign key violation raised by the storage layer).
#[instrument(skip(db))]
pub async fn delete_customer(db: &DatabaseConnection, customer_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let customer = Customer::find_by_id(customer_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            name: customer_id.to_string(),
        })?;

    let count = Invoice::find()
        .filter(invoice::Column::CustomerId.eq(customer_id))
        .count(&txn)
        .await?;
    if count > 0 {
        return Err(Error::CustomerHasInvoices {
            name: customer.name,
            count,
        });
    }

    customer.delete(&txn).await?;
    txn.commit().await?;

    info!(customer_id, "Customer deleted");
    Ok(())
}
