//! # Currency Conversion
//!
//! The engine never looks up exchange rates itself. When an option has no
//! price in the package's currency and settings allow it, the price row in
//! another currency is converted through a [`CurrencyConverter`] supplied by
//! the caller.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::money::Money;

/// Converts an amount into another currency.
///
/// Returns `None` when no rate is known; the option is then left out.
pub trait CurrencyConverter: Send + Sync {
    fn convert(&self, amount: &Money, to: &str) -> Option<Money>;
}

/// Converter that knows no rates. Only same-currency conversions succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConversion;

impl CurrencyConverter for NoConversion {
    fn convert(&self, amount: &Money, to: &str) -> Option<Money> {
        amount.currency().eq_ignore_ascii_case(to).then(|| amount.clone())
    }
}

/// Fixed rates relative to one base currency.
///
/// A rate of `1.10` for `"USD"` with base `"EUR"` means 1 EUR = 1.10 USD.
/// Converted amounts are not rounded; the line item builder rounds once.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    base: String,
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn new(base: impl Into<String>) -> Self {
        RateTable {
            base: base.into().to_uppercase(),
            rates: HashMap::new(),
        }
    }

    /// Adds (or replaces) the rate of `currency` against the base.
    pub fn with_rate(mut self, currency: impl Into<String>, rate: Decimal) -> Self {
        self.rates.insert(currency.into().to_uppercase(), rate);
        self
    }

    fn rate(&self, currency: &str) -> Option<Decimal> {
        if currency == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(currency).copied().filter(|rate| !rate.is_zero())
    }
}

impl CurrencyConverter for RateTable {
    fn convert(&self, amount: &Money, to: &str) -> Option<Money> {
        let to = to.to_uppercase();
        if amount.currency() == to {
            return Some(amount.clone());
        }

        let from_rate = self.rate(amount.currency())?;
        let to_rate = self.rate(&to)?;
        let in_base = amount.amount().checked_div(from_rate)?;
        Some(Money::new(in_base.checked_mul(to_rate)?, to))
    }
}
