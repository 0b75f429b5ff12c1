//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Customer management commands
pub mod customer;

/// General utility commands
pub mod general;

/// Invoice creation, listing and rendering
pub mod invoice;

/// Exchange rate commands
pub mod rate;

/// Position template management commands
pub mod template;

// Export commands
pub use customer::*;
pub use general::*;
pub use invoice::*;
pub use rate::*;
pub use template::*;
