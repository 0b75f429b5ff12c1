//! Applies or rolls back schema migrations by hand.
//!
//! ```text
//! migrate [up | down [N] | status | fresh]
//! ```
//!
//! The database is resolved the same way the bot does it: `DATABASE_URL`, then
//! `[database] url` in config.toml, then the default `SQLite` file.

use dotenvy::dotenv;
use invoice_buddy::{
    config::{database, settings},
    errors::{Error, Result},
    migration::Migrator,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Up,
    Down(u32),
    Status,
    Fresh,
}

fn parse_command(args: &[String]) -> Result<Command> {
    let usage = || Error::Config {
        message: "usage: migrate [up | down [N] | status | fresh]".to_string(),
    };
    match args {
        [] => Ok(Command::Up),
        [cmd] if cmd == "up" => Ok(Command::Up),
        [cmd] if cmd == "down" => Ok(Command::Down(1)),
        [cmd, steps] if cmd == "down" => steps
            .parse()
            .ok()
            .filter(|steps| *steps > 0)
            .map(Command::Down)
            .ok_or_else(usage),
        [cmd] if cmd == "status" => Ok(Command::Status),
        [cmd] if cmd == "fresh" => Ok(Command::Fresh),
        _ => Err(usage()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let settings = settings::load_default_settings()?;
    let db = database::create_connection(&database::get_database_url(&settings)).await?;

    match command {
        Command::Up => Migrator::up(&db, None).await?,
        Command::Down(steps) => Migrator::down(&db, Some(steps)).await?,
        Command::Status => Migrator::status(&db).await?,
        Command::Fresh => Migrator::fresh(&db).await?,
    }
    info!(?command, "Migration command finished");
    Ok(())
}
