//! # Pricing Settings
//!
//! Company-level switches that shape a breakdown. The caller loads them (from
//! its settings store, or from a TOML file in the preview app) and hands them
//! to the presenter, which validates them once.
//!
//! ## Settings File Format
//! ```toml
//! date_format = "%b %-d, %Y"
//! recur = false
//! proratable_periods = ["month", "year"]
//! multi_currency_pricing = "exchange_rate"
//!
//! [tax]
//! enable_tax = true
//! tax_exempt = false
//! setup_fee_tax = true
//! cancelation_fee_tax = false
//! cascade_tax = false
//! ```

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::{PricingError, PricingResult, ValidationError};
use crate::period::Period;

// =============================================================================
// Tax Settings
// =============================================================================

/// Switches controlling which tax rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Master switch; nothing is taxed when off.
    #[serde(default)]
    pub enable_tax: bool,

    /// The customer (or company) is exempt from tax.
    #[serde(default)]
    pub tax_exempt: bool,

    /// Setup fees are taxed like the item they belong to.
    #[serde(default)]
    pub setup_fee_tax: bool,

    /// Cancellation fees are taxed like the item they belong to.
    #[serde(default)]
    pub cancelation_fee_tax: bool,

    /// Apply all rules as one compounding group instead of independently.
    #[serde(default)]
    pub cascade_tax: bool,
}

impl TaxSettings {
    /// Returns true if a taxable package would be taxed at all.
    pub fn taxes_apply(&self) -> bool {
        self.enable_tax && !self.tax_exempt
    }
}

// =============================================================================
// Multi-Currency Pricing
// =============================================================================

/// What to do when an option has no price in the package's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiCurrencyPricing {
    /// Only explicitly configured currency prices are used; the option is
    /// left out.
    #[default]
    Package,

    /// Convert a price from another currency through the exchange-rate
    /// collaborator.
    ExchangeRate,
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Complete settings for one presenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub tax: TaxSettings,

    /// strftime pattern for dates shown in prorated descriptions.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Price for a renewal: coupons are resolved in their recurring context.
    #[serde(default)]
    pub recur: bool,

    /// Periods whose terms are prorated.
    #[serde(default = "default_proratable_periods")]
    pub proratable_periods: Vec<Period>,

    #[serde(default)]
    pub multi_currency_pricing: MultiCurrencyPricing,
}

fn default_date_format() -> String {
    "%b %-d, %Y".to_string()
}

fn default_proratable_periods() -> Vec<Period> {
    vec![Period::Month, Period::Year]
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            tax: TaxSettings::default(),
            date_format: default_date_format(),
            recur: false,
            proratable_periods: default_proratable_periods(),
            multi_currency_pricing: MultiCurrencyPricing::default(),
        }
    }
}

impl PricingSettings {
    /// Validates the settings.
    pub fn validate(&self) -> PricingResult<()> {
        if self.date_format.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "date_format".into(),
            }
            .into());
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ValidationError::InvalidFormat {
                field: "date_format".into(),
                reason: format!("'{}' is not a valid strftime pattern", self.date_format),
            }
            .into());
        }

        // Time and zone specifiers parse but cannot render a bare date
        if !renders_date(&self.date_format) {
            return Err(ValidationError::InvalidFormat {
                field: "date_format".into(),
                reason: format!("'{}' cannot render a calendar date", self.date_format),
            }
            .into());
        }

        if self.proratable_periods.contains(&Period::Onetime) {
            return Err(PricingError::InvalidSettings(
                "onetime terms cannot be prorated".into(),
            ));
        }

        Ok(())
    }
}

/// Returns true if `format` renders a `NaiveDate` without error.
fn renders_date(format: &str) -> bool {
    let Some(sample) = NaiveDate::from_ymd_opt(2000, 1, 1) else {
        return false;
    };
    let mut out = String::new();
    write!(out, "{}", sample.format(format)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PricingSettings::default();
        assert!(!settings.tax.enable_tax);
        assert_eq!(settings.proratable_periods, vec![Period::Month, Period::Year]);
        assert_eq!(settings.multi_currency_pricing, MultiCurrencyPricing::Package);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_taxes_apply() {
        let mut tax = TaxSettings {
            enable_tax: true,
            ..TaxSettings::default()
        };
        assert!(tax.taxes_apply());

        tax.tax_exempt = true;
        assert!(!tax.taxes_apply());
    }

    #[test]
    fn test_validation() {
        let mut settings = PricingSettings::default();

        settings.date_format = "  ".into();
        assert!(settings.validate().is_err());

        settings.date_format = "%Y-%m-%Q".into();
        assert!(settings.validate().is_err());

        settings.date_format = "%Y-%m-%d %H:%M".into();
        assert!(matches!(
            settings.validate(),
            Err(PricingError::Validation(ValidationError::InvalidFormat { .. }))
        ));

        settings.date_format = "%Y-%m-%d".into();
        settings.proratable_periods.push(Period::Onetime);
        assert!(matches!(settings.validate(), Err(PricingError::InvalidSettings(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: PricingSettings =
            serde_json::from_str(r#"{"tax": {"enable_tax": true, "cascade_tax": true}}"#).unwrap();
        assert!(settings.tax.enable_tax);
        assert!(settings.tax.cascade_tax);
        assert!(!settings.tax.setup_fee_tax);
        assert_eq!(settings.date_format, "%b %-d, %Y");
    }

    #[test]
    fn test_unknown_period_is_reported() {
        let err = serde_json::from_str::<PricingSettings>(r#"{"proratable_periods": ["month", "monthly"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Unknown billing period: 'monthly'"));

        let settings: PricingSettings =
            serde_json::from_str(r#"{"proratable_periods": ["Week", "one-time"]}"#).unwrap();
        assert_eq!(settings.proratable_periods, vec![Period::Week, Period::Onetime]);
    }
}
