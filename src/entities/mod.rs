//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod customer;
pub mod exchange_rate;
pub mod invoice;
pub mod invoice_position;
pub mod numeric;
pub mod position_template;

// Re-export specific types to avoid conflicts
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use exchange_rate::{
    Column as ExchangeRateColumn, Entity as ExchangeRate, Model as ExchangeRateModel,
};
pub use invoice::{
    Column as InvoiceColumn, Entity as Invoice, InvoiceStatus, Model as InvoiceModel,
};
pub use invoice_position::{
    Column as InvoicePositionColumn, Entity as InvoicePosition, Model as InvoicePositionModel,
};
pub use numeric::Numeric;
pub use position_template::{
    Column as PositionTemplateColumn, Entity as PositionTemplate, Model as PositionTemplateModel,
};
