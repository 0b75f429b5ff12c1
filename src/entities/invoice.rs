//! Invoice entity - the header of an assembled invoice.
//!
//! Invoices are append-only: the assembler inserts the header as a draft, adds the
//! positions, then stores the total and marks it sent in the same transaction.

use super::numeric::Numeric;
use async_trait::async_trait;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle marker of an invoice
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Header exists, positions and total are still being written
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Fully assembled
    #[sea_orm(string_value = "sent")]
    Sent,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Sent => f.write_str("sent"),
        }
    }
}

/// Invoice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice")]
pub struct Model {
    /// Surrogate key, also the allocation order for invoice numbers
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Externally stable identifier
    #[sea_orm(unique)]
    pub uuid: Uuid,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
    /// Human-facing sequential number, zero-padded (`"00042"`)
    #[sea_orm(unique)]
    pub number: String,
    /// Billing period label (`"2024-03"`)
    pub period: String,
    /// Owning customer
    pub customer_id: i64,
    /// Sum of all position amounts, `None` until assembly completes
    #[sea_orm(column_type = "Text", nullable)]
    pub total: Option<Numeric>,
    /// Currency the invoice is issued in
    pub currency: String,
    /// Lifecycle marker
    pub status: InvoiceStatus,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice belongs to one customer; customers with invoices cannot be deleted
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Customer,
    /// One invoice has many positions
    #[sea_orm(has_many = "super::invoice_position::Entity")]
    Positions,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::invoice_position::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Positions.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert {
            if self.uuid.is_not_set() {
                self.uuid = Set(Uuid::new_v4());
            }
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
