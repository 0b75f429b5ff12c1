/// Database URL resolution, connection and migrations
pub mod database;

/// Application settings loaded from config.toml
pub mod settings;
