//! Exchange rate entity - a currency pair conversion rate effective on a date.
//! Stored for reference only; invoice totals are never converted.

use super::numeric::Numeric;
use async_trait::async_trait;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Exchange rate database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exchange_rate")]
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
    /// Day from which the rate applies
    pub effective_on: Date,
    /// Source currency code
    pub from_currency: String,
    /// Target currency code
    pub to_currency: String,
    /// Units of `to_currency` per unit of `from_currency`
    #[sea_orm(column_type = "Text")]
    pub rate: Numeric,
}

/// `ExchangeRate` has no relationships with other entities
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
