//! Versioned schema migrations.
//!
//! Applied automatically when the bot starts and on demand through the `migrate`
//! binary. Each migration derives its tables from the entity definitions so the
//! schema cannot drift from the Rust models.

use sea_orm_migration::prelude::*;

mod m20240301_000001_create_tables;

/// Runs all migrations in order.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240301_000001_create_tables::Migration)]
    }
}
