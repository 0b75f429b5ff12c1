//! Invoice position entity - one line item of an invoice.
//!
//! Positions are written only by the assembler, in input order, and are never
//! reassigned to another invoice.

use super::numeric::Numeric;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice position database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_position")]
pub struct Model {
    /// Surrogate key, creation order within an invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Externally stable identifier
    #[sea_orm(unique)]
    pub uuid: Uuid,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
    /// Owning invoice
    pub invoice_id: i64,
    /// Line item text
    pub description: String,
    /// Billed quantity
    #[sea_orm(column_type = "Text")]
    pub quantity: Numeric,
    /// Price per unit
    #[sea_orm(column_type = "Text")]
    pub unit_price: Numeric,
    /// Currency of the unit price
    pub currency: String,
    /// Optional path of a supporting document
    pub attachment_path: Option<String>,
}

impl Model {
    /// `quantity × unit_price`, `None` on overflow.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        self.quantity.value().checked_mul(self.unit_price.value())
    }
}

/// Defines relationships between `InvoicePosition` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each position belongs to one invoice
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
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
