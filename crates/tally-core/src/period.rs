//! # Billing Periods
//!
//! `Period` is the unit of a pricing schedule and `PricingTerm` pairs it with
//! a count: "1 month", "3 months", "2 years", "once".

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricingError;

// =============================================================================
// Period
// =============================================================================

/// Billing period unit.
///
/// Deserializes through `FromStr`, so an unknown name surfaces as
/// `PricingError::UnknownPeriod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    /// Charged once, never renewed and never prorated.
    Onetime,
}

impl Period {
    /// Returns true for one-time (non-recurring) pricing.
    #[inline]
    pub fn is_onetime(&self) -> bool {
        matches!(self, Period::Onetime)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Day => write!(f, "day"),
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
            Period::Year => write!(f, "year"),
            Period::Onetime => write!(f, "onetime"),
        }
    }
}

impl FromStr for Period {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "onetime" | "one-time" => Ok(Period::Onetime),
            other => Err(PricingError::UnknownPeriod(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Pricing Term
// =============================================================================

/// A term/period pair such as "3 months".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PricingTerm {
    /// Number of periods. Zero only for one-time pricing.
    pub term: u32,
    pub period: Period,
}

impl PricingTerm {
    /// Creates a term. One-time rows commonly carry `term = 0`; a zero
    /// recurring term has no length and is never prorated.
    pub fn new(term: u32, period: Period) -> Self {
        PricingTerm { term, period }
    }

    /// Returns the date one full term after `start`.
    ///
    /// Month and year arithmetic clamps to the last day of the target month
    /// (Jan 31 + 1 month = Feb 28/29). Returns `None` for one-time and zero
    /// terms and for dates outside chrono's range.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use tally_core::period::{Period, PricingTerm};
    ///
    /// let start = NaiveDate::from_ymd_opt(2026, 11, 11).unwrap();
    /// let end = PricingTerm::new(1, Period::Month).advance(start).unwrap();
    /// assert_eq!(end, NaiveDate::from_ymd_opt(2026, 12, 11).unwrap());
    /// ```
    pub fn advance(&self, start: NaiveDate) -> Option<NaiveDate> {
        if self.term == 0 {
            return None;
        }
        match self.period {
            Period::Day => start.checked_add_days(Days::new(u64::from(self.term))),
            Period::Week => start.checked_add_days(Days::new(7 * u64::from(self.term))),
            Period::Month => start.checked_add_months(Months::new(self.term)),
            Period::Year => start.checked_add_months(Months::new(self.term.checked_mul(12)?)),
            Period::Onetime => None,
        }
    }

    /// Length of one full term in days, measured from `start`.
    pub fn days_from(&self, start: NaiveDate) -> Option<i64> {
        self.advance(start).map(|end| (end - start).num_days())
    }
}

impl fmt::Display for PricingTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.period.is_onetime() {
            write!(f, "onetime")
        } else {
            write!(f, "{} {}", self.term, self.period)
        }
    }
}
