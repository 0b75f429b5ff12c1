use invoice_buddy::{
    bot::{self, BotData},
    config::{database, settings},
    core::seed,
    errors::{Error, Result},
    render::InvoiceRenderer,
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load config.toml (defaults when absent)
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;

    // 4. Connect and bring the schema up to date
    let database_url = database::get_database_url(&settings);
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::run_migrations(&db)
        .await
        .inspect_err(|e| error!("Failed to run migrations: {}", e))?;

    // 5. Seed customers and templates from config.toml
    seed::seed_from_config(&db, &settings)
        .await
        .inspect_err(|e| error!("Failed to seed from config: {}", e))?;

    // 6. Load the document layout so a broken layout is reported before going online
    let renderer = InvoiceRenderer::from_template_dir(
        &settings.render.template_dir,
        settings.render.output_dir.clone(),
    )
    .inspect_err(|e| error!("Failed to load document layout: {}", e))?;
    info!(
        output_dir = %renderer.output_dir().display(),
        "Documents will be written below the output directory"
    );

    // 7. Run the bot, the token is read directly before use
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(&token, BotData::new(db, renderer)).await
}
