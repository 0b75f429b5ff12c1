//! Invoice business logic - numbering and assembly of invoices.
//!
//! An invoice is assembled in a single database transaction: the next number is
//! read, the header is inserted as a draft, every position is inserted in input
//! order while the total is accumulated with exact decimal arithmetic, and finally
//! the total and the `sent` status are stored. Any failure rolls the whole unit back.
//!
//! Numbers follow the latest invoice (highest id): a purely numeric number is
//! incremented and zero-padded to five digits, anything else restarts at `00001`.
//! On `SQLite` a concurrent writer usually surfaces as a busy or locked database
//! rather than a duplicate number; both are rolled back and retried with a freshly
//! read number. The UNIQUE number column is the backstop that keeps a duplicate
//! from ever being committed.

use crate::{
    core::ensure_non_negative,
    entities::{
        Customer, Invoice, InvoicePosition, InvoiceStatus, customer, invoice, invoice_position,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, RuntimeErr, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Number given to the first invoice, and after a non-numeric number
pub const FIRST_INVOICE_NUMBER: &str = "00001";

/// How many times an assembly is attempted when it collides with another writer
pub const MAX_NUMBER_ATTEMPTS: u32 = 3;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// One validated line item handed to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemInput {
    /// Line item text
    pub description: String,
    /// Billed quantity, non-negative
    pub quantity: Decimal,
    /// Price per unit, non-negative
    pub unit_price: Decimal,
    /// Currency code of the unit price
    pub currency: String,
    /// Optional attachment path
    pub attachment_path: Option<String>,
}

/// A persisted invoice together with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledInvoice {
    /// The invoice header
    pub invoice: invoice::Model,
    /// The customer it is addressed to
    pub customer: customer::Model,
    /// Positions in creation order
    pub positions: Vec<invoice_position::Model>,
}

impl AssembledInvoice {
    /// The stored total, zero if it was never computed.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.invoice.total.map_or(Decimal::ZERO, |total| total.value())
    }
}

/// Formats a billing period label (`YYYY-MM`).
///
/// # Errors
/// Returns `Error::InvalidPeriod` unless `1 <= year <= 9999` and `1 <= month <= 12`.
pub fn billing_period(year: i32, month: u32) -> Result<String> {
    if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
        return Err(Error::InvalidPeriod { year, month });
    }
    Ok(format!("{year:04}-{month:02}"))
}

/// Derives the number following `last`.
///
/// # Errors
/// Returns `Error::NumberExhausted` if `last` is numeric but too large to increment.
pub fn increment_invoice_number(last: Option<&str>) -> Result<String> {
    match last {
        Some(number) if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) => {
            let next = number
                .parse::<u64>()
                .ok()
                .and_then(|value| value.checked_add(1))
                .ok_or_else(|| Error::NumberExhausted {
                    number: number.to_string(),
                })?;
            Ok(format!("{next:05}"))
        }
        _ => Ok(FIRST_INVOICE_NUMBER.to_string()),
    }
}

/// Reads the latest invoice and derives the next number from it.
pub async fn next_invoice_number<C>(db: &C) -> Result<String>
where
    C: ConnectionTrait,
{
    let latest = Invoice::find()
        .order_by_desc(invoice::Column::Id)
        .one(db)
        .await?;
    increment_invoice_number(latest.as_ref().map(|inv| inv.number.as_str()))
}

/// Creates an invoice with its positions and total as one unit of work.
///
/// Line items are taken as given; blank descriptions are the caller's concern (see
/// [`crate::core::draft::InvoiceDraft::into_line_items`]). An empty slice produces
/// an invoice with total `0`.
///
/// # Errors
/// - `Error::InvalidPeriod` or `Error::InvalidAmount` before storage is touched
/// - `Error::CustomerNotFound` if the customer no longer exists
/// - `Error::AmountOverflow` if the total does not fit a decimal
/// - `Error::NumberConflict` if every attempt collided with an existing number
/// - `Error::Database` if the database stayed busy for every attempt
/// - `Error::Database` for any other storage failure
///
/// Nothing is persisted when an error is returned.
#[instrument(skip(db, customer, line_items), fields(customer_id = customer.id, items = line_items.len()))]
pub async fn assemble_invoice(
    db: &DatabaseConnection,
    customer: &customer::Model,
    year: i32,
    month: u32,
    line_items: &[LineItemInput],
) -> Result<AssembledInvoice> {
    let period = billing_period(year, month)?;
    for item in line_items {
        ensure_non_negative(item.quantity)?;
        ensure_non_negative(item.unit_price)?;
    }

    let mut attempt = 1;
    loop {
        match assemble_once(db, customer.id, &period, line_items, attempt).await {
            Ok(assembled) => {
                info!(
                    number = %assembled.invoice.number,
                    period = %assembled.invoice.period,
                    total = %assembled.total(),
                    "Invoice assembled"
                );
                return Ok(assembled);
            }
            Err(Error::NumberConflict { number, .. }) if attempt < MAX_NUMBER_ATTEMPTS => {
                warn!(%number, attempt, "Invoice number already taken, retrying");
                attempt += 1;
            }
            Err(Error::Database(e)) if attempt < MAX_NUMBER_ATTEMPTS && is_busy(&e) => {
                warn!(attempt, "Database busy, retrying: {e}");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Whether the database rejected the unit of work because another writer held it.
fn is_busy(err: &DbErr) -> bool {
    let (DbErr::Conn(RuntimeErr::SqlxError(e))
    | DbErr::Exec(RuntimeErr::SqlxError(e))
    | DbErr::Query(RuntimeErr::SqlxError(e))) = err
    else {
        return false;
    };
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| is_busy_code(&code))
}

/// `SQLite` reports extended result codes; the primary code is the low byte.
fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>()
        .is_ok_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

async fn assemble_once(
    db: &DatabaseConnection,
    customer_id: i64,
    period: &str,
    line_items: &[LineItemInput],
    attempt: u32,
) -> Result<AssembledInvoice> {
    let txn = db.begin().await?;

    let customer = Customer::find_by_id(customer_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            name: customer_id.to_string(),
        })?;

    let number = next_invoice_number(&txn).await?;
    debug!(%number, attempt, "Allocated invoice number");

    let header = invoice::ActiveModel {
        number: Set(number.clone()),
        period: Set(period.to_string()),
        customer_id: Set(customer.id),
        total: Set(None),
        currency: Set(customer.default_currency.clone()),
        status: Set(InvoiceStatus::Draft),
        ..Default::default()
    };
    let header = match header.insert(&txn).await {
        Ok(header) => header,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(Error::NumberConflict {
                number,
                attempts: attempt,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut total = Decimal::ZERO;
    let mut positions = Vec::with_capacity(line_items.len());
    for item in line_items {
        let amount = item
            .quantity
            .checked_mul(item.unit_price)
            .ok_or(Error::AmountOverflow)?;
        total = total.checked_add(amount).ok_or(Error::AmountOverflow)?;

        let position = invoice_position::ActiveModel {
            invoice_id: Set(header.id),
            description: Set(item.description.clone()),
            quantity: Set(item.quantity.into()),
            unit_price: Set(item.unit_price.into()),
            currency: Set(item.currency.clone()),
            attachment_path: Set(item.attachment_path.clone()),
            ..Default::default()
        };
        positions.push(position.insert(&txn).await?);
    }

    let mut header: invoice::ActiveModel = header.into();
    header.total = Set(Some(total.into()));
    header.status = Set(InvoiceStatus::Sent);
    let invoice = header.update(&txn).await?;

    txn.commit().await?;

    Ok(AssembledInvoice {
        invoice,
        customer,
        positions,
    })
}

/// Finds an invoice by its number.
pub async fn get_invoice_by_number(
    db: &DatabaseConnection,
    number: &str,
) -> Result<Option<invoice::Model>> {
    Invoice::find()
        .filter(invoice::Column::Number.eq(number.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Reloads an invoice with its customer and positions, e.g. to render it again.
///
/// # Errors
/// Returns `Error::InvoiceNotFound`, `Error::CustomerNotFound`, or a database error.
pub async fn load_assembled_invoice(
    db: &DatabaseConnection,
    number: &str,
) -> Result<AssembledInvoice> {
    let invoice = get_invoice_by_number(db, number)
        .await?
        .ok_or_else(|| Error::InvoiceNotFound {
            number: number.trim().to_string(),
        })?;

    let customer = Customer::find_by_id(invoice.customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            name: invoice.customer_id.to_string(),
        })?;

    let positions = invoice
        .find_related(InvoicePosition)
        .order_by_asc(invoice_position::Column::Id)
        .all(db)
        .await?;

    Ok(AssembledInvoice {
        invoice,
        customer,
        positions,
    })
}

/// Lists invoices in creation order, optionally only those of one billing period.
pub async fn list_invoices(
    db: &DatabaseConnection,
    period: Option<&str>,
) -> Result<Vec<invoice::Model>> {
    let mut query = Invoice::find();
    if let Some(period) = period {
        query = query.filter(invoice::Column::Period.eq(period.trim()));
    }
    query
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts the invoices addressed to a customer.
pub async fn count_invoices_for_customer(db: &DatabaseConnection, customer_id: i64) -> Result<u64> {
    Invoice::find()
        .filter(invoice::Column::CustomerId.eq(customer_id))
        .count(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn item(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            description: description.to_string(),
            quantity,
            unit_price,
            currency: "EUR".to_string(),
            attachment_path: None,
        }
    }

    #[test]
    fn test_billing_period() {
        assert_eq!(billing_period(2024, 3).unwrap(), "2024-03");
        assert_eq!(billing_period(2024, 12).unwrap(), "2024-12");
        assert!(matches!(
            billing_period(2024, 0),
            Err(Error::InvalidPeriod { year: 2024, month: 0 })
        ));
        assert!(matches!(
            billing_period(2024, 13),
            Err(Error::InvalidPeriod { .. })
        ));
        assert!(matches!(billing_period(0, 5), Err(Error::InvalidPeriod { .. })));
    }

    #[test]
    fn test_increment_invoice_number() {
        assert_eq!(increment_invoice_number(None).unwrap(), "00001");
        assert_eq!(increment_invoice_number(Some("00001")).unwrap(), "00002");
        assert_eq!(increment_invoice_number(Some("00041")).unwrap(), "00042");
        assert_eq!(increment_invoice_number(Some("7")).unwrap(), "00008");
        assert_eq!(increment_invoice_number(Some("99999")).unwrap(), "100000");
        assert_eq!(increment_invoice_number(Some("INV-7")).unwrap(), "00001");
        assert_eq!(increment_invoice_number(Some("")).unwrap(), "00001");
        assert_eq!(increment_invoice_number(Some("-5")).unwrap(), "00001");
        assert!(matches!(
            increment_invoice_number(Some("18446744073709551615")),
            Err(Error::NumberExhausted { number: _ })
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_storage() -> Result<()> {
        // A mock with no prepared results fails on any query, so these must not reach it
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let customer = customer_model(1, "Acme GmbH");

        let result = assemble_invoice(&db, &customer, 2024, 13, &[]).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidPeriod { .. }));

        let result = assemble_invoice(
            &db,
            &customer,
            2024,
            3,
            &[item("Refund", dec!(1), dec!(-10))],
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_acme_scenario() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;

        let assembled = assemble_invoice(
            &db,
            &customer,
            2024,
            3,
            &[item("Consulting", dec!(10), dec!(150.00))],
        )
        .await?;

        assert_eq!(assembled.invoice.number, "00001");
        assert_eq!(assembled.invoice.period, "2024-03");
        assert_eq!(assembled.invoice.currency, "EUR");
        assert_eq!(assembled.invoice.status, InvoiceStatus::Sent);
        assert_eq!(assembled.total(), dec!(1500.00));
        assert_eq!(assembled.positions.len(), 1);
        assert_eq!(assembled.positions[0].invoice_id, assembled.invoice.id);
        assert_eq!(assembled.customer.id, customer.id);

        // The stored state matches what was returned
        let reloaded = load_assembled_invoice(&db, "00001").await?;
        assert_eq!(reloaded, assembled);

        // The next invoice, for any customer, continues the sequence
        let other = create_test_customer(&db, "Zeta AG").await?;
        let second = assemble_invoice(&db, &other, 2024, 4, &[]).await?;
        assert_eq!(second.invoice.number, "00002");

        Ok(())
    }

    #[tokio::test]
    async fn test_numbers_increase_by_one() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;

        for expected in ["00001", "00002", "00003", "00004"] {
            assert_eq!(next_invoice_number(&db).await?, expected);
            let assembled = assemble_invoice(&db, &customer, 2024, 1, &[]).await?;
            assert_eq!(assembled.invoice.number, expected);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_zero_items_gives_zero_total() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;

        let assembled = assemble_invoice(&db, &customer, 2024, 3, &[]).await?;
        assert_eq!(assembled.invoice.total, Some(dec!(0).into()));
        assert!(assembled.positions.is_empty());
        assert_eq!(assembled.invoice.status, InvoiceStatus::Sent);

        Ok(())
    }

    #[tokio::test]
    async fn test_total_is_exact_decimal_sum() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;

        // 0.1 and 0.2 are not representable in binary floating point
        let items = [
            item("Small thing", dec!(3), dec!(0.1)),
            item("Another", dec!(1), dec!(0.2)),
            item("Hours", dec!(7.25), dec!(98.40)),
        ];
        let assembled = assemble_invoice(&db, &customer, 2024, 3, &items).await?;

        assert_eq!(assembled.total(), dec!(713.9));
        let reloaded = load_assembled_invoice(&db, &assembled.invoice.number).await?;
        assert_eq!(reloaded.total(), dec!(713.9));
        assert_eq!(reloaded.positions[0].unit_price.value(), dec!(0.1));

        let sum: Decimal = reloaded
            .positions
            .iter()
            .map(|p| p.amount().unwrap())
            .sum();
        assert_eq!(sum, reloaded.total());

        Ok(())
    }

    #[tokio::test]
    async fn test_positions_keep_input_order_and_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;

        let mut travel = item("Travel", dec!(1), dec!(89.90));
        travel.currency = "CHF".to_string();
        travel.attachment_path = Some("receipts/train.pdf".to_string());
        let items = [item("First", dec!(1), dec!(1)), travel, item("Last", dec!(2), dec!(3))];

        assemble_invoice(&db, &customer, 2024, 3, &items).await?;
        let reloaded = load_assembled_invoice(&db, "00001").await?;

        let descriptions: Vec<&str> = reloaded
            .positions
            .iter()
            .map(|p| p.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["First", "Travel", "Last"]);
        assert_eq!(reloaded.positions[1].currency, "CHF");
        assert_eq!(
            reloaded.positions[1].attachment_path.as_deref(),
            Some("receipts/train.pdf")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_overflow_rolls_back_everything() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;

        // The header and the first position are written before the overflow is hit
        let items = [
            item("Fine", dec!(1), dec!(10)),
            item("Huge", Decimal::MAX, dec!(2)),
        ];
        let result = assemble_invoice(&db, &customer, 2024, 3, &items).await;
        assert!(matches!(result.unwrap_err(), Error::AmountOverflow));

        assert_eq!(Invoice::find().count(&db).await?, 0);
        assert_eq!(InvoicePosition::find().count(&db).await?, 0);

        // The failed attempt did not consume a number
        let assembled = assemble_invoice(&db, &customer, 2024, 3, &[]).await?;
        assert_eq!(assembled.invoice.number, "00001");

        Ok(())
    }

    #[tokio::test]
    async fn test_non_numeric_latest_number_restarts_sequence() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        insert_raw_invoice(&db, &customer, "LEGACY-17").await?;

        let assembled = assemble_invoice(&db, &customer, 2024, 3, &[]).await?;
        assert_eq!(assembled.invoice.number, "00001");

        Ok(())
    }

    #[tokio::test]
    async fn test_persistent_number_conflict_gives_up() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        assemble_invoice(&db, &customer, 2024, 3, &[item("A", dec!(1), dec!(1))]).await?;
        // The latest number is not numeric, so the next number would be 00001 again
        insert_raw_invoice(&db, &customer, "LEGACY-17").await?;

        let result = assemble_invoice(
            &db,
            &customer,
            2024,
            4,
            &[item("B", dec!(1), dec!(1))],
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NumberConflict { number, attempts: MAX_NUMBER_ATTEMPTS } if number == "00001"
        ));

        assert_eq!(Invoice::find().count(&db).await?, 2);
        assert_eq!(InvoicePosition::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_customer() -> Result<()> {
        let db = setup_test_db().await?;
        let ghost = customer_model(404, "Ghost Ltd");

        let result = assemble_invoice(&db, &ghost, 2024, 3, &[]).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::CustomerNotFound { name: _ }
        ));
        assert_eq!(Invoice::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_invoice_uses_customer_currency() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_custom_customer(&db, "Swiss AG", "CHF").await?;

        let assembled = assemble_invoice(&db, &customer, 2024, 3, &[]).await?;
        assert_eq!(assembled.invoice.currency, "CHF");

        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_count_invoices() -> Result<()> {
        let db = setup_test_db().await?;
        let acme = create_test_customer(&db, "Acme GmbH").await?;
        let zeta = create_test_customer(&db, "Zeta AG").await?;

        assemble_invoice(&db, &acme, 2024, 3, &[]).await?;
        assemble_invoice(&db, &zeta, 2024, 3, &[]).await?;
        assemble_invoice(&db, &acme, 2024, 4, &[]).await?;

        let all = list_invoices(&db, None).await?;
        let numbers: Vec<&str> = all.iter().map(|i| i.number.as_str()).collect();
        assert_eq!(numbers, vec!["00001", "00002", "00003"]);

        let march = list_invoices(&db, Some("2024-03")).await?;
        assert_eq!(march.len(), 2);

        assert_eq!(count_invoices_for_customer(&db, acme.id).await?, 2);
        assert_eq!(count_invoices_for_customer(&db, zeta.id).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_keeps_creation_order_past_five_digits() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "Acme GmbH").await?;
        insert_raw_invoice(&db, &customer, "99999").await?;

        let next = assemble_invoice(&db, &customer, 2024, 3, &[]).await?;
        assert_eq!(next.invoice.number, "100000");

        let numbers: Vec<String> = list_invoices(&db, None)
            .await?
            .into_iter()
            .map(|i| i.number)
            .collect();
        assert_eq!(numbers, vec!["99999", "100000"]);

        Ok(())
    }

    #[test]
    fn test_busy_codes_are_retryable() {
        assert!(is_busy_code("5"));
        assert!(is_busy_code("6"));
        // SQLITE_BUSY_SNAPSHOT and SQLITE_BUSY_RECOVERY
        assert!(is_busy_code("517"));
        assert!(is_busy_code("261"));
        // SQLITE_CONSTRAINT_UNIQUE is handled as a number conflict instead
        assert!(!is_busy_code("2067"));
        assert!(!is_busy_code("19"));
        assert!(!is_busy_code("not a code"));
    }

    #[test]
    fn test_non_driver_errors_are_not_busy() {
        assert!(!is_busy(&DbErr::Custom("database is locked".to_string())));
        assert!(!is_busy(&DbErr::Query(RuntimeErr::Internal("busy".to_string()))));
        assert!(!is_busy(&DbErr::RecordNotFound("invoice".to_string())));
    }

    #[tokio::test]
    async fn test_load_missing_invoice() -> Result<()> {
        let db = setup_test_db().await?;
        let result = load_assembled_invoice(&db, "00042").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvoiceNotFound { number } if number == "00042"
        ));
        Ok(())
    }
}
