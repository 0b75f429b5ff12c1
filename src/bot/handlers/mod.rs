//! Interaction handlers that are not commands themselves.

/// Name suggestions for customer, template and billing period options
pub mod autocomplete;
