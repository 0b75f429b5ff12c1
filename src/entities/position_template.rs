//! Position template entity - a reusable pattern for invoice line items.
//!
//! Templates only prefill new line drafts. A created position keeps no reference
//! to the template it was copied from.

use super::numeric::Numeric;
use async_trait::async_trait;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Position template database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "position_template")]
pub struct Model {
    /// Surrogate key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Externally stable identifier
    #[sea_orm(unique)]
    pub uuid: Uuid,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
    /// Short name used to pick the template (e.g. `"Consulting"`)
    pub name: String,
    /// Line item text copied into the draft
    pub description: String,
    /// Quantity copied into the draft
    #[sea_orm(column_type = "Text")]
    pub default_quantity: Numeric,
    /// Price per unit copied into the draft
    #[sea_orm(column_type = "Text")]
    pub unit_price: Numeric,
    /// Currency of the unit price
    pub currency: String,
    /// Optional path of a supporting document
    pub attachment_path: Option<String>,
}

/// `PositionTemplate` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

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
