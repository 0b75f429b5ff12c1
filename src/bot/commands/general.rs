//! General Discord commands - ping and help.
//! This module contains simple commands that don't require database operations.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**InvoiceBuddy Help**\n\
        Here is a summary of all available commands.\n\n\
        **Invoices**\n\
        • `/invoice create <customer> <year> <month> <lines>` - Creates, numbers and renders an invoice.\n\
        • `/invoice list [period]` - Lists invoices, optionally for one `YYYY-MM` period.\n\
        • `/invoice render <number>` - Renders an existing invoice again.\n\n\
        **Line syntax**\n\
        Separate lines with `;` and fields with `|`:\n\
        `description|quantity|unit price[|currency[|attachment]]` or `@template[|quantity]`\n\
        Example: `Consulting|10|150.00; @Hosting; Travel|1|89,90`\n\n\
        **Management**\n\
        • `/customer <add|list|edit|delete>` - Manage customers.\n\
        • `/template <add|list|edit|delete>` - Manage position templates.\n\
        • `/rate <record|show>` - Record or look up exchange rates.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
