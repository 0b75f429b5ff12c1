//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `InvoiceBuddy` application,
//! including all slash commands, autocomplete handlers, and bot context management.

/// Discord command implementations (customer, template, invoice, rate, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    errors::{Error, Result},
    render::InvoiceRenderer,
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the document renderer.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Renders assembled invoices to PDF files
    pub renderer: InvoiceRenderer,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(database: DatabaseConnection, renderer: InvoiceRenderer) -> Self {
        Self { database, renderer }
    }
}

/// Tells the operator why a request failed.
///
/// Problems with the request itself are answered and swallowed; anything else is
/// answered generically and handed back so the framework logs it.
pub(crate) async fn report_failure(
    ctx: poise::Context<'_, BotData, Error>,
    action: &str,
    error: Error,
) -> Result<()> {
    if error.is_user_error() {
        ctx.say(format!("❌ Could not {action}: {error}")).await?;
        Ok(())
    } else {
        ctx.say(format!("❌ Could not {action}. Please try again later."))
            .await?;
        Err(error)
    }
}

/// Finds the customer named by an autocomplete label (`Name (ID n)`) or a plain name.
pub(crate) async fn resolve_customer(
    db: &DatabaseConnection,
    input: &str,
) -> Result<crate::entities::customer::Model> {
    let found = match handlers::autocomplete::parse_labeled_id(input) {
        Some(id) => crate::core::customer::get_customer_by_id(db, id).await?,
        None => crate::core::customer::get_customer_by_name(db, input).await?,
    };
    found.ok_or_else(|| Error::CustomerNotFound {
        name: input.trim().to_string(),
    })
}

/// Finds a position template by name, ignoring case.
pub(crate) async fn resolve_template(
    db: &DatabaseConnection,
    name: &str,
) -> Result<crate::entities::position_template::Model> {
    crate::core::template::get_template_by_name(db, name)
        .await?
        .ok_or_else(|| Error::TemplateNotFound {
            name: name.trim().to_string(),
        })
}

/// Discord embeds hold at most this many fields
pub(crate) const EMBED_FIELD_LIMIT: usize = 25;

/// Footer text for a list cut down to `shown` of `total` entries.
pub(crate) fn hidden_entries_note(total: usize, shown: usize) -> Option<String> {
    let hidden = total.saturating_sub(shown);
    (hidden > 0).then(|| format!("… and {hidden} more"))
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Every slash command the bot registers
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::customer(),
        commands::template(),
        commands::invoice(),
        commands::rate(),
    ]
}

/// Connects to Discord and serves commands until the client stops.
///
/// # Errors
/// Returns `Error::Framework` if the client cannot be created or the gateway fails.
#[instrument(skip_all)]
pub async fn run_bot(token: &str, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered {} commands globally", framework.options().commands.len());
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Starting bot client...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}
