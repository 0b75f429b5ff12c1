//! Customer entity - the party an invoice is addressed to.
//!
//! Carries the postal address printed on documents and the default currency copied
//! onto new invoices. Registry and tax identifiers are optional.

use async_trait::async_trait;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer")]
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
    /// Display name / company name
    pub name: String,
    /// Postal address, one line per address line
    pub address: String,
    /// ISO currency code used for new invoices (e.g. `"EUR"`)
    pub default_currency: String,
    /// Trade registry number (e.g. `"HRB 12345"`)
    pub company_number: Option<String>,
    /// VAT identification number
    pub vat_number: Option<String>,
    /// Tax number
    pub tax_number: Option<String>,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
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
