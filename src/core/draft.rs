//! Invoice drafts - the line items an operator is putting together.
//!
//! A draft is an explicit value owned by whoever is building the invoice. Each line
//! has a stable 1-based number, so prefilling a line from a template addresses it
//! directly. Templates are copied into the line once; the line keeps no link back.
//!
//! The bot accepts lines in a compact text form, parsed by [`parse_line_specs`]:
//!
//! ```text
//! Consulting March|10|150.00; @Hosting; @Support|2.5; Travel|1|89,90|EUR|receipts/train.pdf
//! ```
//!
//! Lines are separated by `;` and fields by `|`. A line is either
//! `description|quantity|unit_price[|currency[|attachment]]` or
//! `@template name[|quantity]`.

use crate::{
    core::{ensure_non_negative, invoice::LineItemInput, normalize_currency, parse_decimal, template},
    entities::{customer, position_template},
    errors::{Error, Result},
};
use rust_decimal::Decimal;

/// One line of an invoice draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemDraft {
    /// Stable 1-based line number
    pub line_no: usize,
    /// Line item text
    pub description: String,
    /// Billed quantity
    pub quantity: Decimal,
    /// Price per unit
    pub unit_price: Decimal,
    /// Currency code, blank means the invoice currency
    pub currency: String,
    /// Optional attachment path
    pub attachment_path: Option<String>,
}

impl LineItemDraft {
    fn blank(line_no: usize, currency: &str) -> Self {
        Self {
            line_no,
            description: String::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
            currency: currency.to_string(),
            attachment_path: None,
        }
    }

    /// Overwrites this line with the template's values.
    pub fn apply_template(&mut self, template: &position_template::Model) {
        self.description.clone_from(&template.description);
        self.quantity = template.default_quantity.value();
        self.unit_price = template.unit_price.value();
        self.currency.clone_from(&template.currency);
        self.attachment_path.clone_from(&template.attachment_path);
    }
}

/// A line as written by the operator, before templates are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSpec {
    /// All values typed in
    Manual {
        /// Line item text
        description: String,
        /// Billed quantity
        quantity: Decimal,
        /// Price per unit
        unit_price: Decimal,
        /// Currency code, `None` means the invoice currency
        currency: Option<String>,
        /// Optional attachment path
        attachment_path: Option<String>,
    },
    /// Prefilled from a template, optionally with a different quantity
    Template {
        /// Template name
        name: String,
        /// Replaces the template's default quantity
        quantity: Option<Decimal>,
    },
}

/// Parses the compact line syntax described in the module docs.
///
/// # Errors
/// Returns `Error::Validation` naming the offending line when a line has the wrong
/// number of fields or a number cannot be parsed.
pub fn parse_line_specs(text: &str) -> Result<Vec<LineSpec>> {
    text.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(index, segment)| {
            parse_line_spec(segment).map_err(|e| Error::Validation {
                message: format!("Position {}: {}", index + 1, validation_message(e)),
            })
        })
        .collect()
}

fn parse_line_spec(segment: &str) -> Result<LineSpec> {
    if let Some(reference) = segment.strip_prefix('@') {
        let mut fields = reference.split('|').map(str::trim);
        let name = fields.next().unwrap_or_default().to_string();
        if name.is_empty() {
            return Err(Error::Validation {
                message: "template name is missing after '@'".to_string(),
            });
        }
        let quantity = fields.next().map(parse_decimal).transpose()?;
        if fields.next().is_some() {
            return Err(Error::Validation {
                message: "a template line takes at most a quantity".to_string(),
            });
        }
        return Ok(LineSpec::Template { name, quantity });
    }

    let fields: Vec<&str> = segment.split('|').map(str::trim).collect();
    match fields.as_slice() {
        [description, quantity, unit_price, rest @ ..] if rest.len() <= 2 => Ok(LineSpec::Manual {
            description: (*description).to_string(),
            quantity: parse_decimal(quantity)?,
            unit_price: parse_decimal(unit_price)?,
            currency: rest
                .first()
                .filter(|currency| !currency.is_empty())
                .map(|currency| (*currency).to_string()),
            attachment_path: rest
                .get(1)
                .filter(|path| !path.is_empty())
                .map(|path| (*path).to_string()),
        }),
        _ => Err(Error::Validation {
            message: "expected description|quantity|unit_price[|currency[|attachment]]"
                .to_string(),
        }),
    }
}

fn validation_message(error: Error) -> String {
    match error {
        Error::Validation { message } => message,
        other => other.to_string(),
    }
}

/// An invoice being put together: customer, billing period and numbered lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    /// Customer the invoice is for
    pub customer_id: i64,
    /// Billing year
    pub year: i32,
    /// Billing month, 1-12
    pub month: u32,
    /// Currency lines fall back to, the customer's default
    pub currency: String,
    lines: Vec<LineItemDraft>,
}

impl InvoiceDraft {
    /// Starts an empty draft for a customer and billing period.
    #[must_use]
    pub fn new(customer: &customer::Model, year: i32, month: u32) -> Self {
        Self {
            customer_id: customer.id,
            year,
            month,
            currency: normalize_currency(&customer.default_currency),
            lines: Vec::new(),
        }
    }

    /// The lines in order.
    #[must_use]
    pub fn lines(&self) -> &[LineItemDraft] {
        &self.lines
    }

    /// Appends a blank line (quantity 1, price 0) and returns it for editing.
    pub fn add_line(&mut self) -> &mut LineItemDraft {
        let line_no = self.lines.len() + 1;
        self.lines.push(LineItemDraft::blank(line_no, &self.currency));
        let index = self.lines.len() - 1;
        &mut self.lines[index]
    }

    /// Returns the line with the given number.
    pub fn line_mut(&mut self, line_no: usize) -> Option<&mut LineItemDraft> {
        self.lines.iter_mut().find(|line| line.line_no == line_no)
    }

    /// Copies a template into an existing line.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the draft has no such line.
    pub fn apply_template(
        &mut self,
        line_no: usize,
        template: &position_template::Model,
    ) -> Result<()> {
        let line = self.line_mut(line_no).ok_or_else(|| Error::Validation {
            message: format!("Position {line_no} does not exist"),
        })?;
        line.apply_template(template);
        Ok(())
    }

    /// Appends one line per spec, resolving template references against `templates`.
    ///
    /// # Errors
    /// Returns `Error::TemplateNotFound` for an unknown template name.
    pub fn fill(
        &mut self,
        specs: Vec<LineSpec>,
        templates: &[position_template::Model],
    ) -> Result<()> {
        for spec in specs {
            match spec {
                LineSpec::Manual {
                    description,
                    quantity,
                    unit_price,
                    currency,
                    attachment_path,
                } => {
                    let line = self.add_line();
                    line.description = description;
                    line.quantity = quantity;
                    line.unit_price = unit_price;
                    if let Some(currency) = currency {
                        line.currency = currency;
                    }
                    line.attachment_path = attachment_path;
                }
                LineSpec::Template { name, quantity } => {
                    let template = template::find_by_name(templates, &name)
                        .ok_or(Error::TemplateNotFound { name })?;
                    let line = self.add_line();
                    line.apply_template(template);
                    if let Some(quantity) = quantity {
                        line.quantity = quantity;
                    }
                }
            }
        }
        Ok(())
    }

    /// Validates the draft and converts it into assembler input.
    ///
    /// # Errors
    /// Returns `Error::Validation` if there are no lines or a line has a blank
    /// description, and `Error::InvalidAmount` for a negative quantity or price.
    pub fn into_line_items(self) -> Result<Vec<LineItemInput>> {
        if self.lines.is_empty() {
            return Err(Error::Validation {
                message: "An invoice needs at least one position".to_string(),
            });
        }

        let fallback_currency = self.currency;
        self.lines
            .into_iter()
            .map(|line| {
                let description = line.description.trim().to_string();
                if description.is_empty() {
                    return Err(Error::Validation {
                        message: format!("Position {} has no description", line.line_no),
                    });
                }

                let currency = if line.currency.trim().is_empty() {
                    fallback_currency.clone()
                } else {
                    normalize_currency(&line.currency)
                };

                Ok(LineItemInput {
                    description,
                    quantity: ensure_non_negative(line.quantity)?,
                    unit_price: ensure_non_negative(line.unit_price)?,
                    currency,
                    attachment_path: line.attachment_path,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Numeric;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sea_orm::prelude::Uuid;

    fn customer(currency: &str) -> customer::Model {
        let now = Utc::now();
        customer::Model {
            id: 7,
            uuid: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: "Acme GmbH".to_string(),
            address: "Street 1".to_string(),
            default_currency: currency.to_string(),
            company_number: None,
            vat_number: None,
            tax_number: None,
        }
    }

    fn template(name: &str) -> position_template::Model {
        let now = Utc::now();
        position_template::Model {
            id: 1,
            uuid: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            description: format!("{name} services"),
            default_quantity: Numeric(dec!(8)),
            unit_price: Numeric(dec!(95.50)),
            currency: "USD".to_string(),
            attachment_path: Some("terms.pdf".to_string()),
        }
    }

    #[test]
    fn test_parse_manual_and_template_lines() {
        let specs = parse_line_specs(
            "Consulting|10|150.00; @Hosting ;@Support|2,5; Travel|1|89,90|chf|receipts/train.pdf;",
        )
        .unwrap();

        assert_eq!(specs.len(), 4);
        assert_eq!(
            specs[0],
            LineSpec::Manual {
                description: "Consulting".to_string(),
                quantity: dec!(10),
                unit_price: dec!(150.00),
                currency: None,
                attachment_path: None,
            }
        );
        assert_eq!(
            specs[1],
            LineSpec::Template {
                name: "Hosting".to_string(),
                quantity: None,
            }
        );
        assert_eq!(
            specs[2],
            LineSpec::Template {
                name: "Support".to_string(),
                quantity: Some(dec!(2.5)),
            }
        );
        assert_eq!(
            specs[3],
            LineSpec::Manual {
                description: "Travel".to_string(),
                quantity: dec!(1),
                unit_price: dec!(89.90),
                currency: Some("chf".to_string()),
                attachment_path: Some("receipts/train.pdf".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_errors_name_the_position() {
        let err = parse_line_specs("Consulting|10|150; Broken|x|1").unwrap_err();
        match err {
            Error::Validation { message } => assert!(message.starts_with("Position 2:")),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(parse_line_specs("Only a description").is_err());
        assert!(parse_line_specs("a|1|2|EUR|file|extra").is_err());
        assert!(parse_line_specs("@").is_err());
        assert!(parse_line_specs("@Hosting|1|2").is_err());
    }

    #[test]
    fn test_empty_text_parses_to_no_lines() {
        assert!(parse_line_specs("  ; ;").unwrap().is_empty());
    }

    #[test]
    fn test_lines_get_stable_numbers() {
        let mut draft = InvoiceDraft::new(&customer("EUR"), 2024, 3);
        draft.add_line().description = "First".to_string();
        draft.add_line().description = "Second".to_string();

        assert_eq!(draft.lines()[0].line_no, 1);
        assert_eq!(draft.lines()[1].line_no, 2);
        assert_eq!(draft.line_mut(2).unwrap().description, "Second");
        assert!(draft.line_mut(3).is_none());
    }

    #[test]
    fn test_apply_template_copies_values() {
        let mut draft = InvoiceDraft::new(&customer("EUR"), 2024, 3);
        draft.add_line();
        draft.apply_template(1, &template("Consulting")).unwrap();

        let line = &draft.lines()[0];
        assert_eq!(line.description, "Consulting services");
        assert_eq!(line.quantity, dec!(8));
        assert_eq!(line.unit_price, dec!(95.50));
        assert_eq!(line.currency, "USD");
        assert_eq!(line.attachment_path.as_deref(), Some("terms.pdf"));

        assert!(draft.apply_template(5, &template("Consulting")).is_err());
    }

    #[test]
    fn test_fill_resolves_templates_and_overrides_quantity() {
        let templates = vec![template("Hosting")];
        let mut draft = InvoiceDraft::new(&customer("eur"), 2024, 3);
        draft
            .fill(
                parse_line_specs("Consulting|10|150; @hosting|2").unwrap(),
                &templates,
            )
            .unwrap();

        let items = draft.into_line_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].currency, "EUR");
        assert_eq!(items[1].description, "Hosting services");
        assert_eq!(items[1].quantity, dec!(2));
        assert_eq!(items[1].currency, "USD");
    }

    #[test]
    fn test_fill_unknown_template() {
        let mut draft = InvoiceDraft::new(&customer("EUR"), 2024, 3);
        let result = draft.fill(parse_line_specs("@Missing").unwrap(), &[]);
        assert!(matches!(result, Err(Error::TemplateNotFound { name }) if name == "Missing"));
    }

    #[test]
    fn test_into_line_items_validation() {
        let empty = InvoiceDraft::new(&customer("EUR"), 2024, 3);
        assert!(matches!(
            empty.into_line_items(),
            Err(Error::Validation { .. })
        ));

        let mut blank = InvoiceDraft::new(&customer("EUR"), 2024, 3);
        blank.add_line().description = "   ".to_string();
        assert!(matches!(
            blank.into_line_items(),
            Err(Error::Validation { message }) if message.contains("Position 1")
        ));

        let mut negative = InvoiceDraft::new(&customer("EUR"), 2024, 3);
        let line = negative.add_line();
        line.description = "Refund".to_string();
        line.unit_price = dec!(-10);
        assert!(matches!(
            negative.into_line_items(),
            Err(Error::InvalidAmount { amount: _ })
        ));
    }
}
