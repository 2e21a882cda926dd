//! # Preview Configuration
//!
//! Company settings and exchange rates for the preview run.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_ENABLE_TAX=true                                              │
//! │     TALLY_CASCADE_TAX=false                                            │
//! │     TALLY_TAX_EXEMPT=false                                             │
//! │     TALLY_RECUR=false                                                  │
//! │     TALLY_DATE_FORMAT="%Y-%m-%d"                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/tally-preview/preview.toml (Linux)                       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     tax off, "%b %-d, %Y", month/year proratable, no exchange rates    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [pricing]
//! date_format = "%b %-d, %Y"
//! multi_currency_pricing = "exchange_rate"
//!
//! [pricing.tax]
//! enable_tax = true
//! cascade_tax = true
//!
//! [exchange]
//! base = "USD"
//! rates = { EUR = "0.92", GBP = "0.79" }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use tally_core::{PricingSettings, RateTable};

use crate::error::PreviewResult;

// =============================================================================
// Exchange Rates
// =============================================================================

/// Fixed exchange rates relative to `base`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default)]
    pub base: Option<String>,

    #[serde(default)]
    pub rates: BTreeMap<String, Decimal>,
}

impl ExchangeConfig {
    /// Builds a rate table, if a base currency is configured.
    pub fn rate_table(&self) -> Option<RateTable> {
        let base = self.base.as_deref()?;
        let table = self
            .rates
            .iter()
            .fold(RateTable::new(base), |table, (currency, rate)| {
                table.with_rate(currency, *rate)
            });
        Some(table)
    }
}

// =============================================================================
// Preview Configuration
// =============================================================================

/// Complete preview configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub exchange: ExchangeConfig,
}

impl PreviewConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (preview.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> PreviewResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading preview config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.pricing.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flag = |key: &str| -> Option<bool> {
            let raw = lookup(key)?;
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" => Some(false),
                _ => {
                    warn!(key, value = %raw, "Ignoring non-boolean environment override");
                    None
                }
            }
        };

        if let Some(on) = flag("TALLY_ENABLE_TAX") {
            debug!(enable_tax = on, "Overriding enable_tax from environment");
            self.pricing.tax.enable_tax = on;
        }

        if let Some(on) = flag("TALLY_CASCADE_TAX") {
            self.pricing.tax.cascade_tax = on;
        }

        if let Some(on) = flag("TALLY_TAX_EXEMPT") {
            self.pricing.tax.tax_exempt = on;
        }

        if let Some(on) = flag("TALLY_RECUR") {
            self.pricing.recur = on;
        }

        if let Some(format) = lookup("TALLY_DATE_FORMAT") {
            debug!(date_format = %format, "Overriding date format from environment");
            self.pricing.date_format = format;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "tally-preview")
            .map(|dirs| dirs.config_dir().join("preview.toml"))
    }
}
