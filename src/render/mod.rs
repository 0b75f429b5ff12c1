//! Document renderer - turns an assembled invoice into a PDF file.
//!
//! The invoice is first rendered through the tera layout `invoice.txt.tera` into
//! fixed-column plain text, which [`pdf::text_to_pdf`] then lays out on A4 pages.
//! Documents land at `<output_dir>/<period>/<number>.pdf` and are written through a
//! temporary file in the same directory, so the final path never holds a partial
//! document.

pub mod pdf;

use crate::{
    core::invoice::AssembledInvoice,
    entities::invoice,
    errors::{Error, Result},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tera::{Context, Tera, Value};
use tracing::{debug, info, instrument};

/// Name of the layout every template directory must provide
pub const LAYOUT_NAME: &str = "invoice.txt.tera";

/// Renders invoices with one layout into one output directory.
#[derive(Debug, Clone)]
pub struct InvoiceRenderer {
    tera: Tera,
    output_dir: PathBuf,
}

impl InvoiceRenderer {
    /// Loads every `*.tera` file below `template_dir`.
    ///
    /// # Errors
    /// Returns `Error::Render` if a layout fails to parse or `invoice.txt.tera` is missing.
    pub fn from_template_dir(
        template_dir: impl AsRef<Path>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let pattern = format!("{}/**/*.tera", template_dir.as_ref().display());
        let tera = Tera::new(&pattern)?;
        debug!(%pattern, "Document layouts loaded");
        Self::with_tera(tera, output_dir.into())
    }

    /// Uses `layout` as the invoice layout.
    ///
    /// # Errors
    /// Returns `Error::Render` if the layout fails to parse.
    pub fn from_layout(layout: &str, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(LAYOUT_NAME, layout)?;
        Self::with_tera(tera, output_dir.into())
    }

    fn with_tera(mut tera: Tera, output_dir: PathBuf) -> Result<Self> {
        if !tera.get_template_names().any(|name| name == LAYOUT_NAME) {
            return Err(Error::Render {
                message: format!("Layout '{LAYOUT_NAME}' not found"),
            });
        }
        // Plain text output, nothing to escape
        tera.autoescape_on(vec![]);
        tera.register_filter("pad_left", pad_left);
        tera.register_filter("pad_right", pad_right);
        Ok(Self { tera, output_dir })
    }

    /// Root directory documents are written below
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the document for `invoice` is (or will be) stored.
    ///
    /// # Errors
    /// Returns `Error::Render` if the period or number cannot be used as a file name.
    pub fn document_path(&self, invoice: &invoice::Model) -> Result<PathBuf> {
        let period = path_component(&invoice.period)?;
        let number = path_component(&invoice.number)?;
        Ok(self.output_dir.join(period).join(format!("{number}.pdf")))
    }

    /// Fills the layout for `assembled` and returns the plain text.
    ///
    /// # Errors
    /// Returns `Error::Render` if the layout fails to evaluate, or
    /// `Error::AmountOverflow` if a position amount cannot be computed.
    pub fn render_text(&self, assembled: &AssembledInvoice) -> Result<String> {
        let view = DocumentView::new(assembled)?;
        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(LAYOUT_NAME, &context)?)
    }

    /// Renders `assembled` to its PDF file, replacing any earlier rendering.
    ///
    /// # Errors
    /// Returns `Error::Render` for layout or PDF encoding failures and `Error::Io`
    /// if the file cannot be written.
    #[instrument(skip(self, assembled), fields(number = %assembled.invoice.number))]
    pub fn render(&self, assembled: &AssembledInvoice) -> Result<PathBuf> {
        let target = self.document_path(&assembled.invoice)?;
        let text = self.render_text(assembled)?;
        let bytes = pdf::text_to_pdf(&text)?;
        write_atomically(&target, &bytes)?;
        info!(path = %target.display(), bytes = bytes.len(), "Invoice document written");
        Ok(target)
    }
}

fn path_component(value: &str) -> Result<&str> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.chars().any(char::is_control);
    if invalid {
        return Err(Error::Render {
            message: format!("'{value}' cannot be used in a document path"),
        });
    }
    Ok(value)
}

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target.parent().ok_or_else(|| Error::Render {
        message: format!("{} has no parent directory", target.display()),
    })?;
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Formats money with exactly two decimals, rounding half away from zero.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

/// Formats a unit price without rounding: trailing zeros dropped, at least two decimals.
#[must_use]
pub fn format_unit_price(price: Decimal) -> String {
    let mut exact = price.normalize();
    if exact.scale() < 2 {
        exact.rescale(2);
    }
    exact.to_string()
}

/// Width of the description column in the shipped layout
pub const DESCRIPTION_WIDTH: usize = 40;

/// Breaks a description into lines of at most `width` characters, at spaces where
/// possible. Words longer than `width` are split.
fn wrap_description(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        if chars.is_empty() {
            continue;
        }
        let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars.iter());
        current_len += chars.len();
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Serialize)]
struct DocumentView<'a> {
    invoice: InvoiceView<'a>,
    customer: CustomerView<'a>,
    positions: Vec<PositionView<'a>>,
}

#[derive(Serialize)]
struct InvoiceView<'a> {
    number: &'a str,
    period: &'a str,
    currency: &'a str,
    status: String,
    total: String,
}

#[derive(Serialize)]
struct CustomerView<'a> {
    name: &'a str,
    address: &'a str,
    address_lines: Vec<&'a str>,
    company_number: Option<&'a str>,
    vat_number: Option<&'a str>,
    tax_number: Option<&'a str>,
}

#[derive(Serialize)]
struct PositionView<'a> {
    line_no: usize,
    description: &'a str,
    description_first: String,
    description_rest: Vec<String>,
    quantity: String,
    unit_price: String,
    amount: String,
    currency: &'a str,
    attachment_path: Option<&'a str>,
}

impl<'a> DocumentView<'a> {
    fn new(assembled: &'a AssembledInvoice) -> Result<Self> {
        let AssembledInvoice {
            invoice,
            customer,
            positions,
        } = assembled;

        let positions = positions
            .iter()
            .enumerate()
            .map(|(index, position)| {
                let amount = position.amount().ok_or(Error::AmountOverflow)?;
                let mut description_rest =
                    wrap_description(&position.description, DESCRIPTION_WIDTH).into_iter();
                let description_first = description_rest.next().unwrap_or_default();
                Ok(PositionView {
                    line_no: index + 1,
                    description: &position.description,
                    description_first,
                    description_rest: description_rest.collect(),
                    quantity: position.quantity.value().normalize().to_string(),
                    unit_price: format_unit_price(position.unit_price.value()),
                    amount: format_money(amount),
                    currency: &position.currency,
                    attachment_path: position.attachment_path.as_deref(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            invoice: InvoiceView {
                number: &invoice.number,
                period: &invoice.period,
                currency: &invoice.currency,
                status: invoice.status.to_string(),
                total: format_money(assembled.total()),
            },
            customer: CustomerView {
                name: &customer.name,
                address: &customer.address,
                address_lines: customer
                    .address
                    .split([',', '\n'])
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect(),
                company_number: customer.company_number.as_deref(),
                vat_number: customer.vat_number.as_deref(),
                tax_number: customer.tax_number.as_deref(),
            },
            positions,
        })
    }
}

fn pad_left(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let (text, width) = pad_args(value, args, "pad_left")?;
    Ok(Value::String(format!("{text:>width$}")))
}

fn pad_right(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let (text, width) = pad_args(value, args, "pad_right")?;
    Ok(Value::String(format!("{text:<width$}")))
}

fn pad_args(
    value: &Value,
    args: &HashMap<String, Value>,
    filter: &str,
) -> tera::Result<(String, usize)> {
    let width = args
        .get("width")
        .and_then(Value::as_u64)
        .and_then(|width| usize::try_from(width).ok())
        .ok_or_else(|| tera::Error::msg(format!("Filter `{filter}` needs a `width` argument")))?;
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok((text, width))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::invoice::{LineItemInput, assemble_invoice},
        test_utils::*,
    };
    use rust_decimal_macros::dec;

    const SIMPLE_LAYOUT: &str = "\
INVOICE {{ invoice.number }} {{ invoice.period }}
{{ customer.name }}
{% for p in positions -%}
{{ p.line_no | pad_left(width=3) }} {{ p.description | pad_right(width=12) }}|{{ p.amount | pad_left(width=10) }}
{% endfor -%}
TOTAL {{ invoice.total }} {{ invoice.currency }}
";

    fn shipped_templates() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec!(1500)), "1500.00");
        assert_eq!(format_money(dec!(0.1)), "0.10");
        assert_eq!(format_money(dec!(2.345)), "2.35");
        assert_eq!(format_money(dec!(-2.345)), "-2.35");
        assert_eq!(format_money(dec!(713.9000)), "713.90");
    }

    #[test]
    fn test_format_unit_price_keeps_precision() {
        assert_eq!(format_unit_price(dec!(0.125)), "0.125");
        assert_eq!(format_unit_price(dec!(150)), "150.00");
        assert_eq!(format_unit_price(dec!(150.000)), "150.00");
        assert_eq!(format_unit_price(dec!(0.1)), "0.10");
        assert_eq!(format_unit_price(dec!(12.3456)), "12.3456");
    }

    #[test]
    fn test_wrap_description() {
        assert_eq!(wrap_description("Consulting", 40), vec!["Consulting"]);
        assert_eq!(wrap_description("", 40), vec![""]);
        assert_eq!(
            wrap_description(
                "Consulting services for the migration of the billing platform, March",
                40
            ),
            vec![
                "Consulting services for the migration of",
                "the billing platform, March"
            ]
        );
        assert_eq!(
            wrap_description("ab abcdefghij cd", 4),
            vec!["ab", "abcd", "efgh", "ij", "cd"]
        );
    }

    #[test]
    fn test_pad_filters() {
        let mut args = HashMap::new();
        args.insert("width".to_string(), Value::from(6));

        let left = pad_left(&Value::String("42".to_string()), &args).unwrap();
        assert_eq!(left, Value::String("    42".to_string()));

        let right = pad_right(&Value::from(7), &args).unwrap();
        assert_eq!(right, Value::String("7     ".to_string()));

        // Longer input is never cut
        let long = pad_left(&Value::String("1234567".to_string()), &args).unwrap();
        assert_eq!(long, Value::String("1234567".to_string()));

        assert!(pad_left(&Value::Null, &HashMap::new()).is_err());
    }

    #[test]
    fn test_missing_layout_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.txt.tera"), "hello").unwrap();

        let result = InvoiceRenderer::from_template_dir(dir.path(), dir.path().join("out"));
        assert!(matches!(result.unwrap_err(), Error::Render { .. }));
    }

    #[test]
    fn test_malformed_layout_is_render_error() {
        let result = InvoiceRenderer::from_layout("{% for p in positions %}", "out");
        assert!(matches!(result.unwrap_err(), Error::Render { .. }));
    }

    #[test]
    fn test_document_path_rejects_separators() {
        let renderer = InvoiceRenderer::from_layout(SIMPLE_LAYOUT, "out").unwrap();
        let mut invoice = invoice_stub();
        assert_eq!(
            renderer.document_path(&invoice).unwrap(),
            PathBuf::from("out/2024-03/00001.pdf")
        );

        invoice.number = "../../etc/passwd".to_string();
        assert!(matches!(
            renderer.document_path(&invoice).unwrap_err(),
            Error::Render { .. }
        ));
    }

    fn invoice_stub() -> invoice::Model {
        let now = chrono::Utc::now();
        invoice::Model {
            id: 1,
            uuid: uuid::Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            number: "00001".to_string(),
            period: "2024-03".to_string(),
            customer_id: 1,
            total: Some(dec!(0).into()),
            currency: "EUR".to_string(),
            status: crate::entities::InvoiceStatus::Sent,
        }
    }

    #[tokio::test]
    async fn test_render_text_fills_layout() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        let assembled = assemble_invoice(
            &db,
            &customer,
            2024,
            3,
            &[
                LineItemInput {
                    description: "Consulting".to_string(),
                    quantity: dec!(10),
                    unit_price: dec!(150.00),
                    currency: "EUR".to_string(),
                    attachment_path: None,
                },
                LineItemInput {
                    description: "Travel".to_string(),
                    quantity: dec!(1),
                    unit_price: dec!(0.5),
                    currency: "EUR".to_string(),
                    attachment_path: None,
                },
            ],
        )
        .await?;

        let renderer = InvoiceRenderer::from_layout(SIMPLE_LAYOUT, "out")?;
        let text = renderer.render_text(&assembled)?;
        assert_eq!(
            text,
            "INVOICE 00001 2024-03\n\
             Acme GmbH\n  \
             1 Consulting  |   1500.00\n  \
             2 Travel      |      0.50\n\
             TOTAL 1500.50 EUR\n"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_render_writes_document_under_period() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        let assembled = create_test_invoice(&db, &customer).await?;
        let out = tempfile::tempdir()?;

        let renderer = InvoiceRenderer::from_template_dir(shipped_templates(), out.path())?;
        let path = renderer.render(&assembled)?;

        assert_eq!(path, out.path().join("2024-03").join("00001.pdf"));
        let bytes = std::fs::read(&path)?;
        assert!(bytes.starts_with(b"%PDF-"));

        // Only the document is left behind, no temporary files
        let entries = std::fs::read_dir(out.path().join("2024-03"))?.count();
        assert_eq!(entries, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_rerender_is_identical() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        let assembled = create_test_invoice(&db, &customer).await?;
        let out = tempfile::tempdir()?;
        let renderer = InvoiceRenderer::from_template_dir(shipped_templates(), out.path())?;

        let first_path = renderer.render(&assembled)?;
        let first = std::fs::read(&first_path)?;

        let reloaded = crate::core::invoice::load_assembled_invoice(&db, "00001").await?;
        let second_path = renderer.render(&reloaded)?;
        let second = std::fs::read(&second_path)?;

        assert_eq!(first_path, second_path);
        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_render_leaves_no_file() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        let assembled = create_test_invoice(&db, &customer).await?;
        let out = tempfile::tempdir()?;

        // Parses fine, fails when evaluated
        let renderer =
            InvoiceRenderer::from_layout("{{ invoice.no_such_field }}", out.path())?;
        let result = renderer.render(&assembled);
        assert!(matches!(result.unwrap_err(), Error::Render { .. }));
        assert!(!out.path().join("2024-03").join("00001.pdf").exists());

        Ok(())
    }

    #[tokio::test]
    async fn test_shipped_layout_mentions_everything() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        let assembled = create_test_invoice(&db, &customer).await?;

        let renderer = InvoiceRenderer::from_template_dir(shipped_templates(), "out")?;
        let text = renderer.render_text(&assembled)?;

        assert!(text.contains("00001"));
        assert!(text.contains("2024-03"));
        assert!(text.contains("Acme GmbH"));
        assert!(text.contains("Teststraße 1"));
        assert!(text.contains("Consulting"));
        assert!(text.contains("1500.00"));
        assert!(text.lines().all(|line| line.chars().count() <= pdf::COLUMNS_PER_LINE));

        Ok(())
    }

    #[tokio::test]
    async fn test_shipped_layout_keeps_long_descriptions() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        let description = "Consulting services for the migration of the billing platform, March";
        let assembled = assemble_invoice(
            &db,
            &customer,
            2024,
            3,
            &[LineItemInput {
                description: description.to_string(),
                quantity: dec!(8),
                unit_price: dec!(0.125),
                currency: "EUR".to_string(),
                attachment_path: None,
            }],
        )
        .await?;

        let renderer = InvoiceRenderer::from_template_dir(shipped_templates(), "out")?;
        let text = renderer.render_text(&assembled)?;

        let first = text
            .lines()
            .find(|line| line.contains("Consulting services"))
            .unwrap();
        assert!(first.contains("Consulting services for the migration of"));
        assert!(first.contains("0.125"));
        assert!(first.contains("1.00"));
        assert!(!first.contains("0.13"));
        assert!(text.lines().any(|line| line == "    the billing platform, March"));

        let words: Vec<&str> = description.split_whitespace().collect();
        let rendered: Vec<&str> = text.split_whitespace().collect();
        let start = rendered.iter().position(|w| *w == "Consulting").unwrap();
        let description_words: Vec<&str> = rendered[start..]
            .iter()
            .copied()
            .filter(|w| words.contains(w))
            .take(words.len())
            .collect();
        assert_eq!(description_words, words);

        Ok(())
    }
}
