//! `InvoiceBuddy` - A Discord bot for monthly invoicing
//!
//! This crate keeps customers and reusable position templates, assembles numbered
//! invoices with exact decimal totals in a single transaction, and renders each
//! invoice to a PDF document filed by billing period.

#![deny(
    unsafe_code,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
#![warn(
    missing_docs,
    future_incompatible,
    rust_2018_idioms,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    // Money must never pass through floats
    clippy::float_arithmetic,
    clippy::float_cmp,
    clippy::cast_precision_loss,
    // Panics in a long-running bot take every pending interaction with them
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::exit,
    clippy::clone_on_ref_ptr,
    clippy::needless_pass_by_value,
    clippy::large_enum_variant,
    clippy::too_many_lines,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]
// poise::command expands to undocumented items, so missing_docs stays a warning.

/// Discord bot interface - commands, handlers, and bot context
pub mod bot;
/// Configuration management for database and application settings
pub mod config;
/// Core business logic - framework-agnostic customer, template and invoice operations
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Versioned database schema migrations
pub mod migration;
/// Invoice document rendering (tera layout to PDF)
pub mod render;

#[cfg(test)]
pub mod test_utils;
