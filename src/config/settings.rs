//! Application settings loaded from config.toml
//!
//! The file configures the database location, where document layouts are read from
//! and where rendered invoices are written, plus optional customers and position
//! templates to seed on first run.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// `[database]` table
    #[serde(default)]
    pub database: DatabaseSettings,
    /// `[render]` table
    #[serde(default)]
    pub render: RenderSettings,
    /// Customers to seed
    #[serde(default)]
    pub customers: Vec<CustomerConfig>,
    /// Position templates to seed
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

/// Database settings
#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSettings {
    /// Connection string; `DATABASE_URL` takes precedence when set
    pub url: Option<String>,
}

/// Document rendering settings
#[derive(Debug, Deserialize)]
pub struct RenderSettings {
    /// Directory holding `invoice.txt.tera`
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    /// Root directory for rendered documents
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// A customer to seed
#[derive(Debug, Deserialize, Clone)]
pub struct CustomerConfig {
    /// Display name / company name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Currency for new invoices
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Trade registry number
    #[serde(default)]
    pub company_number: Option<String>,
    /// VAT identification number
    #[serde(default)]
    pub vat_number: Option<String>,
    /// Tax number
    #[serde(default)]
    pub tax_number: Option<String>,
}

/// A position template to seed
#[derive(Debug, Deserialize, Clone)]
pub struct TemplateConfig {
    /// Template name
    pub name: String,
    /// Line item text
    pub description: String,
    /// Quantity prefilled into drafts, write it as a string (`"1.5"`) to keep it exact
    #[serde(default = "default_quantity")]
    pub default_quantity: Decimal,
    /// Unit price, write it as a string (`"150.00"`) to keep it exact
    pub unit_price: Decimal,
    /// Currency of the unit price
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Optional attachment path
    #[serde(default)]
    pub attachment_path: Option<String>,
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("invoices")
}

fn default_currency() -> String {
    "EUR".to_string()
}

const fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_settings(&contents)
}

/// Parses settings from TOML text
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from ./config.toml, falling back to defaults when the file does not exist
pub fn load_default_settings() -> Result<Settings> {
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_settings(DEFAULT_CONFIG_PATH)
    } else {
        tracing::info!("No {DEFAULT_CONFIG_PATH} found, using default settings");
        Ok(Settings::default())
    }
}
