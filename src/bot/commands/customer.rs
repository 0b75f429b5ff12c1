//! Customer Discord commands - `/customer add|list|edit|delete`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, EMBED_FIELD_LIMIT, handlers::autocomplete, hidden_entries_note,
            report_failure, resolve_customer,
        },
        core::customer::{self, CustomerInput},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Parent command for managing customers.
    #[poise::command(
        slash_command,
        subcommands("customer_add", "customer_list", "customer_edit", "customer_delete")
    )]
    pub async fn customer(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Customer management command. Available subcommands:\n\
            `/customer add` - Add a new customer\n\
            `/customer list` - List all customers\n\
            `/customer edit` - Change a customer's details\n\
            `/customer delete` - Delete a customer without invoices";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a new customer.
    #[poise::command(slash_command, rename = "add")]
    pub async fn customer_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Company or person name"] name: String,
        #[description = "Postal address, lines separated by commas"] address: String,
        #[description = "Currency for new invoices (default EUR)"] currency: Option<String>,
        #[description = "Trade registry number"] company_number: Option<String>,
        #[description = "VAT identification number"] vat_number: Option<String>,
        #[description = "Tax number"] tax_number: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let input = CustomerInput {
            name,
            address,
            default_currency: currency.unwrap_or_default(),
            company_number,
            vat_number,
            tax_number,
        };

        match customer::create_customer(db, input).await {
            Ok(created) => {
                ctx.say(format!(
                    "✅ Customer **{}** added (ID {}, invoices in {}).",
                    created.name, created.id, created.default_currency
                ))
                .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "add the customer", e).await,
        }
    }

    /// Lists all customers.
    #[poise::command(slash_command, rename = "list")]
    pub async fn customer_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let customers = customer::get_all_customers(db).await?;

        if customers.is_empty() {
            ctx.say("No customers yet. Use `/customer add` to create one!")
                .await?;
            return Ok(());
        }

        let note = hidden_entries_note(customers.len(), EMBED_FIELD_LIMIT);
        let fields = customers.into_iter().take(EMBED_FIELD_LIMIT).map(|c| {
            let mut details = c.address.clone();
            details.push_str(&format!("\nCurrency: {}", c.default_currency));
            if let Some(vat) = &c.vat_number {
                details.push_str(&format!("\nVAT ID: {vat}"));
            }
            (
                autocomplete::customer_label(&c.name, c.id),
                details,
                false,
            )
        });

        let embed = serenity::CreateEmbed::default()
            .title("**Customers**")
            .color(0x0058_65F2)
            .fields(fields);
        let embed = match note {
            Some(note) => embed.footer(serenity::CreateEmbedFooter::new(note)),
            None => embed,
        };

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Changes a customer's details. Options left out keep their current value.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn customer_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer to edit"]
        #[autocomplete = "autocomplete::autocomplete_customer"]
        customer: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New postal address"] address: Option<String>,
        #[description = "New currency for future invoices"] currency: Option<String>,
        #[description = "New trade registry number (\"-\" clears it)"] company_number: Option<
            String,
        >,
        #[description = "New VAT identification number (\"-\" clears it)"] vat_number: Option<
            String,
        >,
        #[description = "New tax number (\"-\" clears it)"] tax_number: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let existing = match resolve_customer(db, &customer).await {
            Ok(existing) => existing,
            Err(e) => return report_failure(ctx, "edit the customer", e).await,
        };

        let input = CustomerInput {
            name: name.unwrap_or_else(|| existing.name.clone()),
            address: address.unwrap_or_else(|| existing.address.clone()),
            default_currency: currency.unwrap_or_else(|| existing.default_currency.clone()),
            company_number: merge_optional(company_number, existing.company_number.clone()),
            vat_number: merge_optional(vat_number, existing.vat_number.clone()),
            tax_number: merge_optional(tax_number, existing.tax_number.clone()),
        };

        match customer::update_customer(db, existing.id, input).await {
            Ok(updated) => {
                ctx.say(format!("✅ Customer **{}** updated.", updated.name))
                    .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "edit the customer", e).await,
        }
    }

    /// Deletes a customer. Customers with invoices cannot be deleted.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn customer_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer to delete"]
        #[autocomplete = "autocomplete::autocomplete_customer"]
        customer: String,
        #[description = "Set to true to really delete"] confirm: Option<bool>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let existing = match resolve_customer(db, &customer).await {
            Ok(existing) => existing,
            Err(e) => return report_failure(ctx, "delete the customer", e).await,
        };

        if confirm != Some(true) {
            ctx.say(format!(
                "⚠️ This deletes customer **{}** permanently. Run the command again with `confirm: true` to proceed.",
                existing.name
            ))
            .await?;
            return Ok(());
        }

        match customer::delete_customer(db, existing.id).await {
            Ok(()) => {
                ctx.say(format!("✅ Customer **{}** has been deleted.", existing.name))
                    .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "delete the customer", e).await,
        }
    }

    /// `None` keeps the current value, `"-"` clears it.
    fn merge_optional(new: Option<String>, current: Option<String>) -> Option<String> {
        match new {
            Some(value) if value.trim() == "-" => None,
            Some(value) => Some(value),
            None => current,
        }
    }
}

// Re-export all commands
pub use inner::*;
