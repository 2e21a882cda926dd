//! # Option Resolution
//!
//! Matches a customer's raw option input against the option catalog.
//!
//! ```text
//! OptionSelection { option_id: 3, value: 4 }
//!        │
//!        ▼  catalog lookup (missing id → skipped)
//! PackageOption #3 "Extra IPs" (quantity mode)
//!        │
//!        ├── discrete:  value compared to OptionValue.value as text
//!        └── quantity:  value read as a count
//!                 Units(n) → priced n times
//!                 Zero     → left out
//!                 NotANumber (text, negative, fraction, null, list, map)
//!                          → left out and logged
//! ```

use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::catalog::{OptionSelection, OptionValue, PackageOption};

// =============================================================================
// Quantity Input
// =============================================================================

/// How a quantity-mode option's raw input was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityInput {
    /// A positive whole count.
    Units(i64),
    /// Explicitly zero: the option is not wanted.
    Zero,
    /// Not a plain non-negative whole number.
    NotANumber,
}

impl QuantityInput {
    /// Reads a count from a JSON number or a numeric string.
    ///
    /// ## Example
    /// ```rust
    /// use serde_json::json;
    /// use tally_core::options::QuantityInput;
    ///
    /// assert_eq!(QuantityInput::from_value(&json!(3)), QuantityInput::Units(3));
    /// assert_eq!(QuantityInput::from_value(&json!("0")), QuantityInput::Zero);
    /// assert_eq!(QuantityInput::from_value(&json!([1])), QuantityInput::NotANumber);
    /// ```
    pub fn from_value(value: &Value) -> Self {
        let count = match value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64)),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };

        match count {
            Some(0) => QuantityInput::Zero,
            Some(n) if n > 0 => QuantityInput::Units(n),
            _ => QuantityInput::NotANumber,
        }
    }
}

/// Text form of a discrete option input, if it has one.
fn discrete_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

// =============================================================================
// Option Catalog
// =============================================================================

/// An option selection matched to its catalog entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOption<'a> {
    pub option: &'a PackageOption,
    pub value: &'a OptionValue,
    /// Unit count for quantity-mode options; `None` for discrete ones.
    pub quantity: Option<i64>,
}

/// The option catalog with an id lookup table.
#[derive(Debug, Clone)]
pub struct OptionCatalog<'a> {
    options: &'a [PackageOption],
    by_id: HashMap<u32, usize>,
}

impl<'a> OptionCatalog<'a> {
    pub fn new(options: &'a [PackageOption]) -> Self {
        let mut by_id = HashMap::with_capacity(options.len());
        for (pos, option) in options.iter().enumerate() {
            by_id.entry(option.id).or_insert(pos);
        }
        OptionCatalog { options, by_id }
    }

    pub fn get(&self, id: u32) -> Option<&'a PackageOption> {
        self.by_id.get(&id).map(|&pos| &self.options[pos])
    }

    /// Matches a selection to an option value, or returns `None` when the
    /// option should not be priced.
    pub fn resolve(&self, selection: &OptionSelection) -> Option<ResolvedOption<'a>> {
        let Some(option) = self.get(selection.option_id) else {
            debug!(option_id = selection.option_id, "Unknown option, skipping");
            return None;
        };

        if option.quantity_mode {
            let units = match QuantityInput::from_value(&selection.value) {
                QuantityInput::Units(n) => n,
                QuantityInput::Zero => return None,
                QuantityInput::NotANumber => {
                    debug!(
                        option_id = option.id,
                        value = %selection.value,
                        "Quantity is not a plain number, skipping option"
                    );
                    return None;
                }
            };
            let value = option.values.first()?;
            return Some(ResolvedOption {
                option,
                value,
                quantity: Some(units),
            });
        }

        let key = discrete_key(&selection.value)?;
        match option.values.iter().find(|v| v.value == key) {
            Some(value) => Some(ResolvedOption {
                option,
                value,
                quantity: None,
            }),
            None => {
                debug!(option_id = option.id, value = %key, "Unknown option value, skipping");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OptionPricing;
    use crate::period::Period;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn value(value: &str, name: &str) -> OptionValue {
        OptionValue {
            value: value.to_string(),
            name: name.to_string(),
            pricing: vec![OptionPricing {
                term: 1,
                period: Period::Month,
                currency: "USD".to_string(),
                price: dec!(2),
                setup_fee: dec!(0),
                cancel_fee: dec!(0),
            }],
        }
    }

    fn catalog() -> Vec<PackageOption> {
        vec![
            PackageOption {
                id: 1,
                label: "Location".to_string(),
                quantity_mode: false,
                values: vec![value("fra", "Frankfurt"), value("7", "Seven")],
            },
            PackageOption {
                id: 2,
                label: "Extra IPs".to_string(),
                quantity_mode: true,
                values: vec![value("ip", "IP")],
            },
        ]
    }

    fn select(option_id: u32, value: Value) -> OptionSelection {
        OptionSelection { option_id, value }
    }

    #[test]
    fn test_quantity_input() {
        assert_eq!(QuantityInput::from_value(&json!(4)), QuantityInput::Units(4));
        assert_eq!(QuantityInput::from_value(&json!(" 12 ")), QuantityInput::Units(12));
        assert_eq!(QuantityInput::from_value(&json!(2.0)), QuantityInput::Units(2));
        assert_eq!(QuantityInput::from_value(&json!(0)), QuantityInput::Zero);
        assert_eq!(QuantityInput::from_value(&json!(-1)), QuantityInput::NotANumber);
        assert_eq!(QuantityInput::from_value(&json!(1.5)), QuantityInput::NotANumber);
        assert_eq!(QuantityInput::from_value(&json!("many")), QuantityInput::NotANumber);
        assert_eq!(QuantityInput::from_value(&json!(null)), QuantityInput::NotANumber);
        assert_eq!(QuantityInput::from_value(&json!({"qty": 2})), QuantityInput::NotANumber);
    }

    #[test]
    fn test_resolve_discrete() {
        let options = catalog();
        let catalog = OptionCatalog::new(&options);

        let resolved = catalog.resolve(&select(1, json!("fra"))).unwrap();
        assert_eq!(resolved.value.name, "Frankfurt");
        assert_eq!(resolved.quantity, None);

        // Numbers match by their text form
        assert_eq!(catalog.resolve(&select(1, json!(7))).unwrap().value.name, "Seven");

        assert!(catalog.resolve(&select(1, json!("ams"))).is_none());
        assert!(catalog.resolve(&select(1, json!(["fra"]))).is_none());
        assert!(catalog.resolve(&select(9, json!("fra"))).is_none());
    }

    #[test]
    fn test_resolve_quantity() {
        let options = catalog();
        let catalog = OptionCatalog::new(&options);

        assert_eq!(catalog.resolve(&select(2, json!(3))).unwrap().quantity, Some(3));
        assert!(catalog.resolve(&select(2, json!(0))).is_none());
        assert!(catalog.resolve(&select(2, json!({"n": 3}))).is_none());
    }
}
