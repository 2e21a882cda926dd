//! # Money Module
//!
//! Provides the `Money` type: an exact decimal amount tagged with its ISO-4217
//! currency code.
//!
//! ## Why Decimal + Currency?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PRICES ARRIVE IN MANY CURRENCIES                                       │
//! │                                                                         │
//! │  Package "Basic":   12.00 USD / month                                    │
//! │                     10.50 EUR / month                                   │
//! │  Coupon "SPRING":   20 %            (any currency)                      │
//! │                     5.00 USD fixed   (USD only)                         │
//! │                                                                         │
//! │  Proration multiplies by a day ratio (20/30), so amounts need more     │
//! │  precision than cents while the ratio is applied. We keep the exact    │
//! │  decimal and round ONCE, at the end, to 2 places.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use tally_core::money::Money;
//!
//! let price = Money::new(Decimal::new(1200, 2), "USD"); // 12.00 USD
//! let prorated = price.scale(Decimal::new(2, 0) / Decimal::new(3, 0)).round_currency();
//! assert_eq!(prorated.amount(), Decimal::new(800, 2));
//! assert_eq!(prorated.to_string(), "USD 8.00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// Decimal places kept after currency rounding.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// An amount in a specific currency.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values represent credits (a removed plan)
/// - **Currency travels with the amount**: line item sets check that their
///   lines share a currency
/// - **Immutable**: every operation returns a new value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "MoneyRepr")]
pub struct Money {
    amount: Decimal,
    currency: String,
}

/// Wire shape of `Money`; deserializing goes through `Money::new` so the
/// currency code is normalized.
#[derive(Deserialize)]
struct MoneyRepr {
    amount: Decimal,
    currency: String,
}

impl From<MoneyRepr> for Money {
    fn from(repr: MoneyRepr) -> Self {
        Money::new(repr.amount, repr.currency)
    }
}

impl Money {
    /// Creates a Money value. The currency code is upper-cased.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Money {
            amount,
            currency: currency.into().to_uppercase(),
        }
    }

    /// Returns the raw decimal amount.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the ISO-4217 currency code.
    #[inline]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true when both values carry the same currency.
    #[inline]
    pub fn same_currency(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Replaces the amount, keeping the currency.
    pub fn with_amount(&self, amount: Decimal) -> Money {
        Money {
            amount,
            currency: self.currency.clone(),
        }
    }

    /// Rounds to 2 decimal places, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    ///
    /// let raw = Money::new(Decimal::new(8005, 3), "USD"); // 8.005
    /// assert_eq!(raw.round_currency().amount(), Decimal::new(801, 2));
    /// ```
    pub fn round_currency(&self) -> Money {
        self.with_amount(
            self.amount
                .round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiplies the amount by an arbitrary ratio without rounding.
    #[inline]
    pub fn scale(&self, ratio: Decimal) -> Money {
        self.with_amount(self.amount * ratio)
    }

    /// Flips a positive amount to negative. Zero and negative amounts are
    /// returned unchanged.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tally_core::money::Money;
    ///
    /// let charge = Money::new(Decimal::TEN, "USD");
    /// assert_eq!(charge.negated_if_positive().amount(), Decimal::from(-10));
    ///
    /// let credit = Money::new(Decimal::from(-3), "USD");
    /// assert_eq!(credit.negated_if_positive().amount(), Decimal::from(-3));
    /// ```
    pub fn negated_if_positive(&self) -> Money {
        if self.is_positive() {
            -self.clone()
        } else {
            self.clone()
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display: `"USD 12.00"`.
///
/// ## Note
/// Output shown to customers goes through a `CurrencyFormatter`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2}",
            self.currency,
            self.amount
                .round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        )
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money {
            amount: -self.amount,
            currency: self.currency,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
