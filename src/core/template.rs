//! Position template business logic - reusable patterns for invoice line items.
//!
//! Templates prefill line drafts (see [`crate::core::draft`]). Editing or deleting a
//! template never affects invoices that were built from it.

use crate::{
    core::{ensure_non_negative, normalize_currency, optional_text},
    entities::{PositionTemplate, position_template},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Operator input for creating or editing a position template.
#[derive(Debug, Clone)]
pub struct TemplateInput {
    /// Short name used to pick the template (required)
    pub name: String,
    /// Line item text (required)
    pub description: String,
    /// Quantity prefilled into drafts
    pub default_quantity: Decimal,
    /// Price per unit
    pub unit_price: Decimal,
    /// Currency, blank means `EUR`
    pub currency: String,
    /// Optional attachment path
    pub attachment_path: Option<String>,
}

impl TemplateInput {
    pub(crate) fn normalized(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        let description = self.description.trim().to_string();
        if name.is_empty() || description.is_empty() {
            return Err(Error::Validation {
                message: "Template name and description are required".to_string(),
            });
        }

        Ok(Self {
            name,
            description,
            default_quantity: ensure_non_negative(self.default_quantity)?,
            unit_price: ensure_non_negative(self.unit_price)?,
            currency: normalize_currency(&self.currency),
            attachment_path: optional_text(self.attachment_path),
        })
    }
}

/// Retrieves all templates ordered alphabetically by name.
pub async fn get_all_templates(db: &DatabaseConnection) -> Result<Vec<position_template::Model>> {
    PositionTemplate::find()
        .order_by_asc(position_template::Column::Name)
        .order_by_asc(position_template::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a template by its id.
pub async fn get_template_by_id(
    db: &DatabaseConnection,
    template_id: i64,
) -> Result<Option<position_template::Model>> {
    PositionTemplate::find_by_id(template_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a template by name, ignoring case and surrounding whitespace.
pub async fn get_template_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<position_template::Model>> {
    let templates = get_all_templates(db).await?;
    Ok(find_by_name(&templates, name).cloned())
}

/// Case-insensitive lookup in an already loaded template list.
#[must_use]
pub fn find_by_name<'a>(
    templates: &'a [position_template::Model],
    name: &str,
) -> Option<&'a position_template::Model> {
    let wanted = name.trim().to_lowercase();
    templates.iter().find(|t| t.name.to_lowercase() == wanted)
}

/// Creates a template after validating the input.
///
/// # Errors
/// Returns `Error::Validation` for a blank name or description,
/// `Error::InvalidAmount` for a negative quantity or price, or a database error.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_template(
    db: &DatabaseConnection,
    input: TemplateInput,
) -> Result<position_template::Model> {
    let input = input.normalized()?;

    let template = position_template::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        default_quantity: Set(input.default_quantity.into()),
        unit_price: Set(input.unit_price.into()),
        currency: Set(input.currency),
        attachment_path: Set(input.attachment_path),
        ..Default::default()
    };

    let created = template.insert(db).await?;
    info!(template_id = created.id, "Position template created");
    Ok(created)
}

/// Replaces all editable fields of an existing template.
///
/// # Errors
/// Same as [`create_template`], plus `Error::TemplateNotFound`.
#[instrument(skip(db, input))]
pub async fn update_template(
    db: &DatabaseConnection,
    template_id: i64,
    input: TemplateInput,
) -> Result<position_template::Model> {
    let input = input.normalized()?;

    let mut template: position_template::ActiveModel = PositionTemplate::find_by_id(template_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::TemplateNotFound {
            name: template_id.to_string(),
        })?
        .into();

    template.name = Set(input.name);
    template.description = Set(input.description);
    template.default_quantity = Set(input.default_quantity.into());
    template.unit_price = Set(input.unit_price.into());
    template.currency = Set(input.currency);
    template.attachment_path = Set(input.attachment_path);

    template.update(db).await.map_err(Into::into)
}

/// Deletes a template. Positions created from it are unaffected.
///
/// # Errors
/// Returns `Error::TemplateNotFound` or a database error.
#[instrument(skip(db))]
pub async fn delete_template(db: &DatabaseConnection, template_id: i64) -> Result<()> {
    let result = PositionTemplate::delete_by_id(template_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::TemplateNotFound {
            name: template_id.to_string(),
        });
    }
    info!(template_id, "Position template deleted");
    Ok(())
}
