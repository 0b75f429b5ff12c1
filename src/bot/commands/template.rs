//! Position template Discord commands - `/template add|list|edit|delete`.
//!
//! Templates hold the description, quantity, price and currency of recurring
//! positions; `/invoice create` copies them into lines written as `@name`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData, EMBED_FIELD_LIMIT, handlers::autocomplete, hidden_entries_note,
            report_failure, resolve_template,
        },
        core::{
            parse_decimal,
            template::{self, TemplateInput},
        },
        errors::{Error, Result},
        render::format_unit_price,
    };
    use poise::serenity_prelude as serenity;
    use rust_decimal::Decimal;

    /// Parent command for managing position templates.
    #[poise::command(
        slash_command,
        subcommands("template_add", "template_list", "template_edit", "template_delete")
    )]
    pub async fn template(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Position template command. Available subcommands:\n\
            `/template add` - Add a new template\n\
            `/template list` - List all templates\n\
            `/template edit` - Change a template\n\
            `/template delete` - Delete a template";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a new position template.
    #[poise::command(slash_command, rename = "add")]
    pub async fn template_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Short name, used as @name in invoice lines"] name: String,
        #[description = "Line item text"] description: String,
        #[description = "Price per unit (e.g., 150.00)"] unit_price: String,
        #[description = "Quantity prefilled into invoices (default 1)"] quantity: Option<String>,
        #[description = "Currency (default EUR)"] currency: Option<String>,
        #[description = "Path of a file to attach"] attachment: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let input = match parse_amounts(&unit_price, quantity.as_deref()) {
            Ok((unit_price, default_quantity)) => TemplateInput {
                name,
                description,
                default_quantity: default_quantity.unwrap_or(Decimal::ONE),
                unit_price,
                currency: currency.unwrap_or_default(),
                attachment_path: attachment,
            },
            Err(e) => return report_failure(ctx, "add the template", e).await,
        };

        match template::create_template(db, input).await {
            Ok(created) => {
                ctx.say(format!(
                    "✅ Template **{}** added: {} × {} {}.",
                    created.name,
                    created.default_quantity.value().normalize(),
                    format_unit_price(created.unit_price.value()),
                    created.currency
                ))
                .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "add the template", e).await,
        }
    }

    /// Lists all position templates.
    #[poise::command(slash_command, rename = "list")]
    pub async fn template_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let templates = template::get_all_templates(db).await?;

        if templates.is_empty() {
            ctx.say("No templates yet. Use `/template add` to create one!")
                .await?;
            return Ok(());
        }

        let note = hidden_entries_note(templates.len(), EMBED_FIELD_LIMIT);
        let fields = templates.into_iter().take(EMBED_FIELD_LIMIT).map(|t| {
            let value = format!(
                "{}\n{} × {} {}",
                t.description,
                t.default_quantity.value().normalize(),
                format_unit_price(t.unit_price.value()),
                t.currency
            );
            (t.name, value, false)
        });

        let embed = serenity::CreateEmbed::default()
            .title("**Position Templates**")
            .color(0x0058_65F2)
            .fields(fields);
        let embed = match note {
            Some(note) => embed.footer(serenity::CreateEmbedFooter::new(note)),
            None => embed,
        };

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Changes a template. Options left out keep their current value.
    #[poise::command(slash_command, rename = "edit")]
    pub async fn template_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Template to edit"]
        #[autocomplete = "autocomplete::autocomplete_template"]
        template: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New line item text"] description: Option<String>,
        #[description = "New price per unit"] unit_price: Option<String>,
        #[description = "New default quantity"] quantity: Option<String>,
        #[description = "New currency"] currency: Option<String>,
        #[description = "New attachment path (\"-\" clears it)"] attachment: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let existing = match resolve_template(db, &template).await {
            Ok(existing) => existing,
            Err(e) => return report_failure(ctx, "edit the template", e).await,
        };

        let parsed = unit_price
            .as_deref()
            .map(parse_decimal)
            .transpose()
            .and_then(|price| {
                let quantity = quantity.as_deref().map(parse_decimal).transpose()?;
                Ok((price, quantity))
            });
        let (new_price, new_quantity) = match parsed {
            Ok(values) => values,
            Err(e) => return report_failure(ctx, "edit the template", e).await,
        };

        let attachment_path = match attachment {
            Some(value) if value.trim() == "-" => None,
            Some(value) => Some(value),
            None => existing.attachment_path.clone(),
        };

        let input = TemplateInput {
            name: name.unwrap_or_else(|| existing.name.clone()),
            description: description.unwrap_or_else(|| existing.description.clone()),
            default_quantity: new_quantity.unwrap_or_else(|| existing.default_quantity.value()),
            unit_price: new_price.unwrap_or_else(|| existing.unit_price.value()),
            currency: currency.unwrap_or_else(|| existing.currency.clone()),
            attachment_path,
        };

        match template::update_template(db, existing.id, input).await {
            Ok(updated) => {
                ctx.say(format!("✅ Template **{}** updated.", updated.name))
                    .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "edit the template", e).await,
        }
    }

    /// Deletes a template. Invoices that used it keep their copied positions.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn template_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Template to delete"]
        #[autocomplete = "autocomplete::autocomplete_template"]
        template: String,
        #[description = "Set to true to really delete"] confirm: Option<bool>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let existing = match resolve_template(db, &template).await {
            Ok(existing) => existing,
            Err(e) => return report_failure(ctx, "delete the template", e).await,
        };

        if confirm != Some(true) {
            ctx.say(format!(
                "⚠️ This deletes template **{}**. Run the command again with `confirm: true` to proceed.",
                existing.name
            ))
            .await?;
            return Ok(());
        }

        match template::delete_template(db, existing.id).await {
            Ok(()) => {
                ctx.say(format!("✅ Template **{}** has been deleted.", existing.name))
                    .await?;
                Ok(())
            }
            Err(e) => report_failure(ctx, "delete the template", e).await,
        }
    }

    fn parse_amounts(unit_price: &str, quantity: Option<&str>) -> Result<(Decimal, Option<Decimal>)> {
        let unit_price = parse_decimal(unit_price)?;
        let quantity = quantity.map(parse_decimal).transpose()?;
        Ok((unit_price, quantity))
    }
}

// Re-export all commands
pub use inner::*;
