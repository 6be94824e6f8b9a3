//! # Engine Configuration
//!
//! Company identity, pricing defaults, document numbering and delivery
//! rules.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     NIAGA_COMPANY_NAME="PT Sinar Jaya"                                 │
//! │     NIAGA_DEFAULT_TAX_MODE=ppn_11_exclusive                            │
//! │     NIAGA_REQUIRE_PROOF_OF_RECEIPT=false                               │
//! │     NIAGA_NUMBER_SEPARATOR=-                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/sales/niaga.toml (Linux)                                 │
//! │     ~/Library/Application Support/id.niaga.sales/niaga.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # niaga.toml
//! [company]
//! name = "PT Sinar Jaya"
//! currency_code = "IDR"
//! currency_symbol = "Rp"
//!
//! [pricing]
//! default_tax_mode = "ppn_11_exclusive"  # none | non_pkp | ppn_11_inclusive | ...
//!
//! [numbering]
//! quotation_prefix = "QUO"
//! sales_order_prefix = "SO"
//! invoice_prefix = "INV"
//! delivery_note_prefix = "SJ"
//! sequence_width = 4
//! separator = "/"
//!
//! [delivery]
//! require_proof_of_receipt = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use niaga_core::{DocumentKind, TaxMode};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Company
// =============================================================================

/// Who is issuing the documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySettings {
    #[serde(default = "default_company_name")]
    pub name: String,

    /// ISO 4217 code.
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_company_name() -> String {
    "Niaga".to_string()
}

fn default_currency_code() -> String {
    "IDR".to_string()
}

fn default_currency_symbol() -> String {
    "Rp".to_string()
}

impl Default for CompanySettings {
    fn default() -> Self {
        CompanySettings {
            name: default_company_name(),
            currency_code: default_currency_code(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Pricing
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Tax mode of a blank new document. Documents created by linking
    /// always start at `none`.
    #[serde(default)]
    pub default_tax_mode: TaxMode,
}

// =============================================================================
// Numbering
// =============================================================================

/// Document number format: `{PREFIX}{sep}{YYYY}{sep}{MM}{sep}{seq}`.
///
/// ```text
///   SO / 2024 / 05 / 0007
///   │     │     │     └── sequence, zero-padded to sequence_width,
///   │     │     │         restarts every month per document type
///   │     │     └── month
///   │     └── year
///   └── prefix per document type
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingSettings {
    #[serde(default = "default_quotation_prefix")]
    pub quotation_prefix: String,

    #[serde(default = "default_sales_order_prefix")]
    pub sales_order_prefix: String,

    #[serde(default = "default_invoice_prefix")]
    pub invoice_prefix: String,

    /// Surat jalan.
    #[serde(default = "default_delivery_note_prefix")]
    pub delivery_note_prefix: String,

    #[serde(default = "default_sequence_width")]
    pub sequence_width: usize,

    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_quotation_prefix() -> String {
    "QUO".to_string()
}
fn default_sales_order_prefix() -> String {
    "SO".to_string()
}
fn default_invoice_prefix() -> String {
    "INV".to_string()
}
fn default_delivery_note_prefix() -> String {
    "SJ".to_string()
}
fn default_sequence_width() -> usize {
    4
}
fn default_separator() -> String {
    "/".to_string()
}

impl Default for NumberingSettings {
    fn default() -> Self {
        NumberingSettings {
            quotation_prefix: default_quotation_prefix(),
            sales_order_prefix: default_sales_order_prefix(),
            invoice_prefix: default_invoice_prefix(),
            delivery_note_prefix: default_delivery_note_prefix(),
            sequence_width: default_sequence_width(),
            separator: default_separator(),
        }
    }
}

impl NumberingSettings {
    pub fn prefix_for(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Quotation => &self.quotation_prefix,
            DocumentKind::SalesOrder => &self.sales_order_prefix,
            DocumentKind::Invoice => &self.invoice_prefix,
            DocumentKind::DeliveryNote => &self.delivery_note_prefix,
        }
    }
}

// =============================================================================
// Delivery
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySettings {
    /// Hold `Diterima` until a proof-of-receipt image is attached.
    #[serde(default = "default_true")]
    pub require_proof_of_receipt: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DeliverySettings {
    fn default() -> Self {
        DeliverySettings {
            require_proof_of_receipt: true,
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub company: CompanySettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub numbering: NumberingSettings,

    #[serde(default)]
    pub delivery: DeliverySettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (niaga.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        for kind in DocumentKind::ALL {
            if self.numbering.prefix_for(kind).trim().is_empty() {
                return Err(EngineError::InvalidConfig(format!("{} prefix must not be empty", kind)));
            }
        }

        if !(1..=9).contains(&self.numbering.sequence_width) {
            return Err(EngineError::InvalidConfig(format!(
                "sequence_width must be between 1 and 9, got {}",
                self.numbering.sequence_width
            )));
        }

        if self.company.currency_code.trim().is_empty() {
            return Err(EngineError::InvalidConfig("currency_code must not be empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(name) = var("NIAGA_COMPANY_NAME") {
            debug!(name = %name, "Overriding company name from environment");
            self.company.name = name;
        }

        if let Some(mode) = var("NIAGA_DEFAULT_TAX_MODE") {
            match mode.parse::<TaxMode>() {
                Ok(parsed) => {
                    debug!(mode = %parsed, "Overriding default tax mode from environment");
                    self.pricing.default_tax_mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown tax mode in environment"),
            }
        }

        if let Some(flag) = var("NIAGA_REQUIRE_PROOF_OF_RECEIPT") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.delivery.require_proof_of_receipt = true,
                "0" | "false" | "no" => self.delivery.require_proof_of_receipt = false,
                _ => warn!(value = %flag, "Unparsable NIAGA_REQUIRE_PROOF_OF_RECEIPT"),
            }
        }

        if let Some(sep) = var("NIAGA_NUMBER_SEPARATOR") {
            debug!(separator = %sep, "Overriding number separator from environment");
            self.numbering.separator = sep;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "niaga", "sales").map(|dirs| dirs.config_dir().join("niaga.toml"))
    }
}
