//! Creates the customer, invoice, invoice position, position template and
//! exchange rate tables.

use crate::entities::{Customer, ExchangeRate, Invoice, InvoicePosition, PositionTemplate};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Referenced tables first, foreign keys are declared inline
        manager
            .create_table(schema.create_table_from_entity(Customer))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Invoice))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(InvoicePosition))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(PositionTemplate))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(ExchangeRate))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExchangeRate).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PositionTemplate).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InvoicePosition).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoice).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customer).to_owned())
            .await?;

        Ok(())
    }
}
