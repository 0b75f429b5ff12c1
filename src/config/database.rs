//! Database configuration module for `InvoiceBuddy`.
//!
//! This module resolves the connection string, opens the `SQLite` database through
//! `SeaORM` and applies the versioned migrations from [`crate::migration`]. The URL
//! comes from the `DATABASE_URL` environment variable, falling back to the
//! `[database] url` entry of config.toml and finally to a local file.

use crate::config::settings::Settings;
use crate::errors::Result;
use crate::migration::Migrator;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use tracing::{debug, info};

/// Used when neither the environment nor config.toml name a database
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/invoice_buddy.sqlite?mode=rwc";

/// Gets the database URL from the environment, then the settings file, then the default.
#[must_use]
pub fn get_database_url(settings: &Settings) -> String {
    pick_database_url(
        std::env::var("DATABASE_URL").ok(),
        settings.database.url.as_deref(),
    )
}

fn pick_database_url(from_env: Option<String>, from_config: Option<&str>) -> String {
    from_env
        .filter(|url| !url.trim().is_empty())
        .or_else(|| from_config.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` URLs the parent directory is created first, `SQLite`
/// creates the file itself but not missing directories.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_parent(database_url) {
        std::fs::create_dir_all(parent)?;
    }

    debug!("Connecting to database: {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Applies every pending migration.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None).await?;
    info!("Database schema is up to date");
    Ok(())
}

fn sqlite_file_parent(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}
