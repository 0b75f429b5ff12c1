//! Invoice Discord commands - `/invoice create|list|render`.
//!
//! Creating an invoice happens in two steps that fail independently: the invoice is
//! assembled and stored, then its document is rendered. A stored invoice whose
//! document failed can be rendered again with `/invoice render`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, report_failure, resolve_customer},
        core::{
            draft::{InvoiceDraft, parse_line_specs},
            invoice::{self, AssembledInvoice},
            template,
        },
        errors::{Error, Result},
        render::format_money,
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;
    use tracing::error;

    /// Parent command for invoices.
    #[poise::command(
        slash_command,
        subcommands("invoice_create", "invoice_list", "invoice_render")
    )]
    pub async fn invoice(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Invoice command. Available subcommands:\n\
            `/invoice create` - Create and render a new invoice\n\
            `/invoice list` - List invoices\n\
            `/invoice render` - Render an existing invoice again";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates the next invoice for a customer and attaches its PDF.
    ///
    /// Lines are separated by `;` and fields by `|`:
    /// `description|quantity|unit price[|currency[|attachment]]` or `@template[|quantity]`.
    #[poise::command(slash_command, rename = "create")]
    pub async fn invoice_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer to bill"]
        #[autocomplete = "autocomplete::autocomplete_customer"]
        customer: String,
        #[description = "Billing year (e.g., 2024)"]
        #[min = 1]
        #[max = 9999]
        year: i32,
        #[description = "Billing month (1-12)"]
        #[min = 1]
        #[max = 12]
        month: u32,
        #[description = "Positions, e.g. Consulting|10|150.00; @Hosting"] lines: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let db = &data.database;

        let (customer, line_items) =
            match build_line_items(db, &customer, year, month, &lines).await {
                Ok(prepared) => prepared,
                Err(e) => return report_failure(ctx, "create the invoice", e).await,
            };

        let assembled =
            match invoice::assemble_invoice(db, &customer, year, month, &line_items).await {
                Ok(assembled) => assembled,
                Err(e) => return report_failure(ctx, "create the invoice", e).await,
            };

        let summary = summarize(&assembled);
        match data.renderer.render(&assembled) {
            Ok(path) => {
                let attachment = serenity::CreateAttachment::path(&path).await?;
                ctx.send(
                    poise::CreateReply::default()
                        .content(format!("✅ {summary}"))
                        .attachment(attachment),
                )
                .await?;
            }
            Err(e) => {
                error!(number = %assembled.invoice.number, "Rendering failed: {e}");
                ctx.say(format!(
                    "⚠️ {summary}\nThe document could not be rendered ({e}). \
                     Fix the layout and run `/invoice render {}`.",
                    assembled.invoice.number
                ))
                .await?;
            }
        }

        Ok(())
    }

    /// Lists invoices, newest number last.
    #[poise::command(slash_command, rename = "list")]
    pub async fn invoice_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this billing period (YYYY-MM)"]
        #[autocomplete = "autocomplete::autocomplete_period"]
        period: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let invoices = invoice::list_invoices(db, period.as_deref()).await?;

        if invoices.is_empty() {
            ctx.say("No invoices found.").await?;
            return Ok(());
        }

        let customers = crate::core::customer::get_all_customers(db).await?;
        let mut text = String::from("**Invoices**\n");
        for inv in &invoices {
            let customer_name = customers
                .iter()
                .find(|c| c.id == inv.customer_id)
                .map_or("Unknown customer", |c| c.name.as_str());
            let total = inv
                .total
                .map_or_else(|| "-".to_string(), |t| format_money(t.value()));
            let _ = writeln!(
                text,
                "`{}` {} · {} · {} {} · {}",
                inv.number, inv.period, customer_name, total, inv.currency, inv.status
            );
        }

        // Discord rejects messages over 2000 characters
        if text.chars().count() > 1900 {
            text = text.chars().take(1900).collect();
            text.push_str("\n…");
        }

        ctx.say(text).await?;
        Ok(())
    }

    /// Renders an existing invoice again and attaches the PDF.
    #[poise::command(slash_command, rename = "render")]
    pub async fn invoice_render(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Invoice number (e.g., 00001)"] number: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();

        let assembled = match invoice::load_assembled_invoice(&data.database, &number).await {
            Ok(assembled) => assembled,
            Err(e) => return report_failure(ctx, "load the invoice", e).await,
        };

        let path = match data.renderer.render(&assembled) {
            Ok(path) => path,
            Err(e) => return report_failure(ctx, "render the invoice", e).await,
        };

        let attachment = serenity::CreateAttachment::path(&path).await?;
        ctx.send(
            poise::CreateReply::default()
                .content(format!("✅ {}", summarize(&assembled)))
                .attachment(attachment),
        )
        .await?;
        Ok(())
    }

    async fn build_line_items(
        db: &sea_orm::DatabaseConnection,
        customer: &str,
        year: i32,
        month: u32,
        lines: &str,
    ) -> Result<(
        crate::entities::customer::Model,
        Vec<invoice::LineItemInput>,
    )> {
        let customer = resolve_customer(db, customer).await?;
        let specs = parse_line_specs(lines)?;
        let templates = template::get_all_templates(db).await?;

        let mut draft = InvoiceDraft::new(&customer, year, month);
        draft.fill(specs, &templates)?;
        let line_items = draft.into_line_items()?;
        Ok((customer, line_items))
    }

    fn summarize(assembled: &AssembledInvoice) -> String {
        format!(
            "Invoice **{}** for **{}**, period {}: {} position(s), total **{} {}**.",
            assembled.invoice.number,
            assembled.customer.name,
            assembled.invoice.period,
            assembled.positions.len(),
            format_money(assembled.total()),
            assembled.invoice.currency
        )
    }
}

// Re-export all commands
pub use inner::*;
