//! # Catalog Types
//!
//! Read-only inputs loaded by the caller from storage: packages and their
//! pricing schedules, configurable options, existing services and
//! prospective selections.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Package "Basic" (taxable, pro-rata day 1)                              │
//! │   ├── PackagePricing #10   1 month   12.00 USD  setup 5.00  cancel 0   │
//! │   └── PackagePricing #11   1 year   120.00 USD  setup 0     cancel 0   │
//! │                                                                         │
//! │  PackageOption #3 "Extra IPs" (quantity mode)                           │
//! │   └── OptionValue "ip"                                                  │
//! │        └── OptionPricing  1 month  2.00 USD / unit                      │
//! │                                                                         │
//! │  Service #77 = Package "Basic" + PackagePricing #10, qty 1,            │
//! │                options [{ option 3, value 4 }]                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pricing rows store one currency next to their amounts, so price, setup fee
//! and cancel fee of a row can never disagree on currency.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::period::{Period, PricingTerm};

// =============================================================================
// Packages
// =============================================================================

/// A sellable package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: u32,
    pub name: String,

    /// Whether tax rules apply to this package at all.
    #[serde(default)]
    pub taxable: bool,

    /// Day of month the billing period restarts on, if the package bills
    /// pro rata.
    #[serde(default)]
    pub prorata_day: Option<u32>,

    /// Every pricing schedule offered for the package.
    #[serde(default)]
    pub pricing: Vec<PackagePricing>,
}

impl Package {
    /// Looks up one of the package's pricing rows by id.
    pub fn find_pricing(&self, pricing_id: u32) -> Option<&PackagePricing> {
        self.pricing.iter().find(|p| p.id == pricing_id)
    }
}

/// One pricing schedule of a package.
///
/// One-time rows may store `term = 0`; recurring rows need a positive term
/// and are rejected when deserialized without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PricingRow")]
pub struct PackagePricing {
    pub id: u32,
    pub package_id: u32,
    pub term: u32,
    pub period: Period,
    pub currency: String,
    pub price: Decimal,
    #[serde(default)]
    pub setup_fee: Decimal,
    #[serde(default)]
    pub cancel_fee: Decimal,
}

/// Wire shape of `PackagePricing`, checked before it is accepted.
#[derive(Deserialize)]
struct PricingRow {
    id: u32,
    package_id: u32,
    term: u32,
    period: Period,
    currency: String,
    price: Decimal,
    #[serde(default)]
    setup_fee: Decimal,
    #[serde(default)]
    cancel_fee: Decimal,
}

impl TryFrom<PricingRow> for PackagePricing {
    type Error = ValidationError;

    fn try_from(row: PricingRow) -> Result<Self, Self::Error> {
        if row.term == 0 && !row.period.is_onetime() {
            return Err(ValidationError::InvalidFormat {
                field: "term".into(),
                reason: format!("pricing {} bills per {} and needs a positive term", row.id, row.period),
            });
        }

        Ok(PackagePricing {
            id: row.id,
            package_id: row.package_id,
            term: row.term,
            period: row.period,
            currency: row.currency,
            price: row.price,
            setup_fee: row.setup_fee,
            cancel_fee: row.cancel_fee,
        })
    }
}

impl PackagePricing {
    pub fn pricing_term(&self) -> PricingTerm {
        PricingTerm::new(self.term, self.period)
    }

    pub fn price(&self) -> Money {
        Money::new(self.price, &self.currency)
    }

    pub fn setup_fee(&self) -> Money {
        Money::new(self.setup_fee, &self.currency)
    }

    pub fn cancel_fee(&self) -> Money {
        Money::new(self.cancel_fee, &self.currency)
    }
}

// =============================================================================
// Options
// =============================================================================

/// A configurable add-on offered with packages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageOption {
    pub id: u32,
    pub label: String,

    /// Quantity-mode options are priced per unit; the customer's input is a
    /// count rather than a choice.
    #[serde(default)]
    pub quantity_mode: bool,

    #[serde(default)]
    pub values: Vec<OptionValue>,
}

/// One selectable value of an option.
///
/// Quantity-mode options carry a single value whose pricing is per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionValue {
    pub value: String,
    pub name: String,
    #[serde(default)]
    pub pricing: Vec<OptionPricing>,
}

/// Price of an option value for one term, period and currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPricing {
    pub term: u32,
    pub period: Period,
    pub currency: String,
    pub price: Decimal,
    #[serde(default)]
    pub setup_fee: Decimal,
    #[serde(default)]
    pub cancel_fee: Decimal,
}

impl OptionPricing {
    /// Returns true if this row prices the given term.
    pub fn matches_term(&self, term: PricingTerm) -> bool {
        self.term == term.term && self.period == term.period
    }
}

/// A customer's choice for one option, exactly as it was submitted.
///
/// `value` is kept raw: discrete options expect a string (or number) naming
/// the chosen value, quantity-mode options expect a plain count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSelection {
    pub option_id: u32,
    pub value: serde_json::Value,
}

// =============================================================================
// Services and Selections
// =============================================================================

/// An existing service: a package the customer already has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: u32,

    /// Customer-facing service name (a domain, a hostname), if any.
    #[serde(default)]
    pub name: Option<String>,

    pub package: Package,
    pub pricing: PackagePricing,

    /// Custom price replacing the pricing row's price.
    #[serde(default)]
    pub override_price: Option<Money>,

    #[serde(default = "default_qty")]
    pub qty: i64,

    #[serde(default)]
    pub options: Vec<OptionSelection>,

    /// Date the current term ends; a service change is prorated up to it.
    #[serde(default)]
    pub renew_date: Option<NaiveDate>,
}

/// A prospective package selection (a cart entry or an upgrade target).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Customer-facing service name, if one was entered.
    #[serde(default)]
    pub name: Option<String>,

    /// Custom price replacing the pricing row's price.
    #[serde(default)]
    pub override_price: Option<Money>,

    /// Defaults to 1 when absent.
    #[serde(default)]
    pub qty: Option<i64>,

    #[serde(default)]
    pub options: Vec<OptionSelection>,
}

fn default_qty() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn basic() -> Package {
        Package {
            id: 1,
            name: "Basic".to_string(),
            taxable: true,
            prorata_day: Some(1),
            pricing: vec![PackagePricing {
                id: 10,
                package_id: 1,
                term: 1,
                period: Period::Month,
                currency: "usd".to_string(),
                price: dec!(12.00),
                setup_fee: dec!(5.00),
                cancel_fee: dec!(0),
            }],
        }
    }

    #[test]
    fn test_find_pricing() {
        let package = basic();
        assert!(package.find_pricing(10).is_some());
        assert!(package.find_pricing(99).is_none());
    }

    #[test]
    fn test_pricing_amounts_share_currency() {
        let pricing = basic().pricing.remove(0);
        assert_eq!(pricing.price().currency(), "USD");
        assert!(pricing.price().same_currency(&pricing.setup_fee()));
        assert!(pricing.setup_fee().same_currency(&pricing.cancel_fee()));
        assert_eq!(pricing.pricing_term(), PricingTerm::new(1, Period::Month));
    }

    #[test]
    fn test_service_defaults_from_json() {
        let json = serde_json::json!({
            "id": 77,
            "package": basic(),
            "pricing": basic().pricing[0],
        });
        let service: Service = serde_json::from_value(json).unwrap();
        assert_eq!(service.qty, 1);
        assert!(service.options.is_empty());
        assert!(service.override_price.is_none());
    }

    #[test]
    fn test_pricing_term_checked_on_deserialize() {
        let onetime: PackagePricing = serde_json::from_value(serde_json::json!({
            "id": 12, "package_id": 1, "term": 0, "period": "onetime",
            "currency": "USD", "price": "50.00",
        }))
        .unwrap();
        assert_eq!(onetime.pricing_term(), PricingTerm::new(0, Period::Onetime));

        let err = serde_json::from_value::<PackagePricing>(serde_json::json!({
            "id": 13, "package_id": 1, "term": 0, "period": "month",
            "currency": "USD", "price": "12.00",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("needs a positive term"));
    }
}
