//! # Proration
//!
//! Charges (or credits) only the fraction of a billing term that is actually
//! used.
//!
//! ## How a Prorated Amount Is Computed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Package "Basic" 12.00 USD / 1 month, pro-rata day = 1                 │
//! │                                                                         │
//! │  start = Nov 11           boundary = Dec 1          start + term       │
//! │     │◄──── 20 days ────────────►│                    = Dec 11          │
//! │     │◄──────────────── 30 days (full term) ─────────────►│             │
//! │                                                                         │
//! │  prorated = 12.00 × 20 / 30 = 8.00                                      │
//! │                                                                         │
//! │  • ratio clamped to [0, 1]                                             │
//! │  • rounded once, at the end, to 2 decimals                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The boundary is either an explicit end date (a service change ends at the
//! service's renewal date) or the next occurrence of the package's anchor day.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::money::Money;
use crate::period::{Period, PricingTerm};

// =============================================================================
// Proration Window
// =============================================================================

/// Whether a prorated line adds a selection or removes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProrationDirection {
    Add,
    Remove,
}

/// The partial period a computation is prorated over.
///
/// Passed by value through every call of one computation and never stored on
/// the presenter, so independent computations can run in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProrationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub direction: ProrationDirection,
}

impl ProrationWindow {
    pub fn new(start: NaiveDate, end: NaiveDate, direction: ProrationDirection) -> Self {
        ProrationWindow {
            start,
            end,
            direction,
        }
    }

    /// Window from `start` to the next occurrence of `anchor_day`.
    ///
    /// Returns `None` if the anchor is not a day of month (1..=31).
    pub fn until_anchor(
        start: NaiveDate,
        anchor_day: u32,
        direction: ProrationDirection,
    ) -> Option<Self> {
        next_anchor_date(start, anchor_day).map(|end| ProrationWindow::new(start, end, direction))
    }

    /// Same dates, opposite direction.
    pub fn reversed(&self) -> Self {
        let direction = match self.direction {
            ProrationDirection::Add => ProrationDirection::Remove,
            ProrationDirection::Remove => ProrationDirection::Add,
        };
        ProrationWindow { direction, ..*self }
    }
}

// =============================================================================
// Anchor Dates
// =============================================================================

/// Returns the next date strictly after `start` whose day of month is
/// `anchor_day`.
///
/// An anchor past the end of a month lands on that month's last day, so an
/// anchor of 31 renews on Feb 28 in non-leap years.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::proration::next_anchor_date;
///
/// let start = NaiveDate::from_ymd_opt(2026, 11, 11).unwrap();
/// assert_eq!(
///     next_anchor_date(start, 1),
///     NaiveDate::from_ymd_opt(2026, 12, 1)
/// );
/// assert_eq!(
///     next_anchor_date(start, 20),
///     NaiveDate::from_ymd_opt(2026, 11, 20)
/// );
/// ```
pub fn next_anchor_date(start: NaiveDate, anchor_day: u32) -> Option<NaiveDate> {
    if !(1..=31).contains(&anchor_day) {
        return None;
    }

    let this_month = clamped_day(start.year(), start.month(), anchor_day)?;
    if this_month > start {
        return Some(this_month);
    }

    let next_month = start.with_day(1)?.checked_add_months(Months::new(1))?;
    clamped_day(next_month.year(), next_month.month(), anchor_day)
}

fn clamped_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last_day = first.checked_add_months(Months::new(1))?.pred_opt()?.day();
    first.with_day(day.min(last_day))
}

// =============================================================================
// Proration Calculator
// =============================================================================

/// Prorates amounts for the periods it is configured to handle.
///
/// By default only month and year terms are proratable; day and week terms
/// are billed in full unless the caller enables them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProrationCalculator {
    proratable: Vec<Period>,
}

impl Default for ProrationCalculator {
    fn default() -> Self {
        ProrationCalculator {
            proratable: vec![Period::Month, Period::Year],
        }
    }
}

impl ProrationCalculator {
    /// Calculator that prorates exactly the given periods. One-time is ignored.
    pub fn with_periods(periods: &[Period]) -> Self {
        ProrationCalculator {
            proratable: periods.iter().copied().filter(|p| !p.is_onetime()).collect(),
        }
    }

    /// Calculator that prorates every recurring period.
    pub fn all_recurring() -> Self {
        Self::with_periods(&[Period::Day, Period::Week, Period::Month, Period::Year])
    }

    /// Returns true if terms of this period are prorated.
    pub fn is_proratable(&self, period: Period) -> bool {
        !period.is_onetime() && self.proratable.contains(&period)
    }

    /// Prorates `amount` for a partial term starting at `start`.
    ///
    /// The boundary is `end_date` when given, otherwise the next occurrence of
    /// `anchor_day`. The amount comes back unchanged when the period is
    /// one-time or not proratable, or when no usable boundary is supplied.
    pub fn prorate(
        &self,
        amount: &Money,
        start: NaiveDate,
        term: PricingTerm,
        anchor_day: Option<u32>,
        end_date: Option<NaiveDate>,
    ) -> Money {
        if !self.is_proratable(term.period) {
            trace!(period = %term.period, "Period not proratable, using full amount");
            return amount.clone();
        }

        let boundary = match (end_date, anchor_day) {
            (Some(end), _) => end,
            (None, Some(day)) => match next_anchor_date(start, day) {
                Some(end) => end,
                None => {
                    trace!(anchor_day = day, "Unusable anchor day, using full amount");
                    return amount.clone();
                }
            },
            (None, None) => return amount.clone(),
        };

        let full_days = match term.days_from(start) {
            Some(days) if days > 0 => days,
            _ => return amount.clone(),
        };

        let window_days = (boundary - start).num_days();
        if window_days <= 0 {
            return amount.with_amount(Decimal::ZERO);
        }

        let ratio = (Decimal::from(window_days) / Decimal::from(full_days)).min(Decimal::ONE);
        amount.scale(ratio).round_currency()
    }

    /// Prorates `amount` over an explicit window.
    pub fn prorate_window(&self, amount: &Money, term: PricingTerm, window: &ProrationWindow) -> Money {
        self.prorate(amount, window.start, term, None, Some(window.end))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, "USD")
    }

    fn monthly() -> PricingTerm {
        PricingTerm::new(1, Period::Month)
    }

    #[test]
    fn test_anchor_day_in_thirty_day_month() {
        let calc = ProrationCalculator::default();
        let prorated = calc.prorate(&usd(dec!(12.00)), date(2026, 11, 11), monthly(), Some(1), None);
        // 20 of 30 days
        assert_eq!(prorated.amount(), dec!(8.00));
    }

    #[test]
    fn test_explicit_end_date_wins_over_anchor() {
        let calc = ProrationCalculator::default();
        let prorated = calc.prorate(
            &usd(dec!(30.00)),
            date(2026, 11, 1),
            monthly(),
            Some(20),
            Some(date(2026, 11, 11)),
        );
        assert_eq!(prorated.amount(), dec!(10.00));
    }

    #[test]
    fn test_onetime_is_never_prorated() {
        let calc = ProrationCalculator::all_recurring();
        let term = PricingTerm::new(1, Period::Onetime);
        let prorated = calc.prorate(&usd(dec!(50)), date(2026, 11, 11), term, Some(1), None);
        assert_eq!(prorated.amount(), dec!(50));
    }

    #[test]
    fn test_no_boundary_returns_amount() {
        let calc = ProrationCalculator::default();
        let prorated = calc.prorate(&usd(dec!(9.999)), date(2026, 11, 11), monthly(), None, None);
        assert_eq!(prorated.amount(), dec!(9.999));
    }

    #[test]
    fn test_invalid_anchor_returns_amount() {
        let calc = ProrationCalculator::default();
        let prorated = calc.prorate(&usd(dec!(12)), date(2026, 11, 11), monthly(), Some(0), None);
        assert_eq!(prorated.amount(), dec!(12));
        let prorated = calc.prorate(&usd(dec!(12)), date(2026, 11, 11), monthly(), Some(32), None);
        assert_eq!(prorated.amount(), dec!(12));
    }

    #[test]
    fn test_weekly_terms_only_prorated_when_enabled() {
        let term = PricingTerm::new(1, Period::Week);
        let start = date(2026, 11, 2);
        let end = Some(date(2026, 11, 5));

        let default_calc = ProrationCalculator::default();
        assert_eq!(default_calc.prorate(&usd(dec!(7)), start, term, None, end).amount(), dec!(7));

        let all = ProrationCalculator::all_recurring();
        assert_eq!(all.prorate(&usd(dec!(7)), start, term, None, end).amount(), dec!(3));
    }

    #[test]
    fn test_zero_length_window_is_zero() {
        let calc = ProrationCalculator::default();
        let start = date(2026, 11, 11);
        let prorated = calc.prorate(&usd(dec!(12)), start, monthly(), None, Some(start));
        assert!(prorated.is_zero());
        assert_eq!(prorated.currency(), "USD");
    }

    #[test]
    fn test_window_past_full_term_clamps_to_amount() {
        let calc = ProrationCalculator::default();
        let prorated = calc.prorate(
            &usd(dec!(12)),
            date(2026, 11, 11),
            monthly(),
            None,
            Some(date(2027, 3, 1)),
        );
        assert_eq!(prorated.amount(), dec!(12));
    }

    #[test]
    fn test_end_before_start_is_zero() {
        let calc = ProrationCalculator::default();
        let prorated = calc.prorate(
            &usd(dec!(12)),
            date(2026, 11, 11),
            monthly(),
            None,
            Some(date(2026, 11, 1)),
        );
        assert!(prorated.is_zero());
    }

    #[test]
    fn test_next_anchor_date() {
        // Start on the anchor day rolls to the following month
        assert_eq!(next_anchor_date(date(2026, 11, 1), 1), Some(date(2026, 12, 1)));
        // Anchor past month end clamps
        assert_eq!(next_anchor_date(date(2026, 2, 10), 31), Some(date(2026, 2, 28)));
        assert_eq!(next_anchor_date(date(2026, 2, 28), 31), Some(date(2026, 3, 31)));
        // Year rollover
        assert_eq!(next_anchor_date(date(2026, 12, 15), 1), Some(date(2027, 1, 1)));
        assert_eq!(next_anchor_date(date(2026, 12, 15), 0), None);
    }

    #[test]
    fn test_window_until_anchor_and_reverse() {
        let window =
            ProrationWindow::until_anchor(date(2026, 11, 11), 1, ProrationDirection::Add).unwrap();
        assert_eq!(window.end, date(2026, 12, 1));
        assert_eq!(window.reversed().direction, ProrationDirection::Remove);
        assert_eq!(window.reversed().start, window.start);
    }

    fn any_start() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| date(y, m, d))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn test_prorated_amount_within_bounds(
            cents in 0i64..10_000_000,
            start in any_start(),
            anchor in 1u32..=31,
            term in 1u32..=24,
            yearly in any::<bool>(),
        ) {
            let amount = usd(Decimal::new(cents, 2));
            let period = if yearly { Period::Year } else { Period::Month };
            let calc = ProrationCalculator::default();
            let prorated = calc.prorate(&amount, start, PricingTerm::new(term, period), Some(anchor), None);

            prop_assert!(prorated.amount() >= Decimal::ZERO);
            prop_assert!(prorated.amount() <= amount.amount());
        }

        #[test]
        fn test_full_term_window_is_full_amount(
            cents in 0i64..10_000_000,
            start in any_start(),
            term in 1u32..=24,
        ) {
            let amount = usd(Decimal::new(cents, 2));
            let term = PricingTerm::new(term, Period::Month);
            let end = term.advance(start).unwrap();
            let calc = ProrationCalculator::default();

            prop_assert_eq!(calc.prorate(&amount, start, term, None, Some(end)), amount.clone());
            prop_assert!(calc.prorate(&amount, start, term, None, Some(start)).is_zero());
        }
    }
}
