//! # Discount Eligibility
//!
//! Decides which coupons from the catalog may discount a package on a given
//! date.
//!
//! ## Eligibility Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  coupon.status == active  AND  package.id ∈ coupon.package_ids         │
//! │       │                                                                 │
//! │       ├── new charge (recurring context = false)                       │
//! │       │     start_date <= date <= end_date                              │
//! │       │     AND (max_qty == 0 OR used_qty < max_qty)                    │
//! │       │                                                                 │
//! │       └── renewal (recurring context = true)                           │
//! │             coupon.recurring == true                                   │
//! │             AND (limit_recurring == false OR date/quota check above)   │
//! │                                                                         │
//! │  Options additionally need coupon.applies_to_options == true           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every eligible coupon applies; coupons stack.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::PricingError;

// =============================================================================
// Coupon
// =============================================================================

/// Coupon status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponStatus {
    #[default]
    Active,
    Inactive,
}

/// How a coupon amount is applied. Deserializes through `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `amount` is a percentage of the line price.
    Percent,
    /// `amount` is a fixed value in the row's currency.
    Fixed,
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountKind::Percent => write!(f, "percent"),
            DiscountKind::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for DiscountKind {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent" => Ok(DiscountKind::Percent),
            "fixed" | "amount" => Ok(DiscountKind::Fixed),
            other => Err(PricingError::UnknownDiscountType(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for DiscountKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Discount value of a coupon in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponAmount {
    pub currency: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
}

/// A discount coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: u32,
    pub code: String,
    #[serde(default)]
    pub status: CouponStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub used_qty: u32,
    /// Maximum redemptions; 0 means unlimited.
    #[serde(default)]
    pub max_qty: u32,
    /// Applies to renewals, not just the first charge.
    #[serde(default)]
    pub recurring: bool,
    /// Renewals are still subject to the date window and quota.
    #[serde(default)]
    pub limit_recurring: bool,
    #[serde(default)]
    pub applies_to_options: bool,
    #[serde(default)]
    pub amounts: Vec<CouponAmount>,
    /// Packages the coupon may discount.
    #[serde(default)]
    pub package_ids: Vec<u32>,
}

impl Coupon {
    /// Returns the amount row for a currency, if the coupon has one.
    pub fn amount_for(&self, currency: &str) -> Option<&CouponAmount> {
        self.amounts
            .iter()
            .find(|row| row.currency.eq_ignore_ascii_case(currency))
    }

    /// Returns true if the coupon may discount the package.
    pub fn covers_package(&self, package_id: u32) -> bool {
        self.package_ids.contains(&package_id)
    }

    /// Date window and redemption quota.
    pub fn within_limits(&self, date: NaiveDate) -> bool {
        let in_window = self.start_date <= date && date <= self.end_date;
        let has_quota = self.max_qty == 0 || self.used_qty < self.max_qty;
        in_window && has_quota
    }

    /// Full eligibility check for one package.
    pub fn applies(&self, package_id: u32, date: NaiveDate, recurring_context: bool) -> bool {
        if self.status != CouponStatus::Active || !self.covers_package(package_id) {
            return false;
        }

        if recurring_context {
            self.recurring && (!self.limit_recurring || self.within_limits(date))
        } else {
            self.within_limits(date)
        }
    }
}

// =============================================================================
// Coupon Index
// =============================================================================

/// The coupon catalog with an id lookup table.
#[derive(Debug, Clone)]
pub struct CouponIndex<'a> {
    coupons: &'a [Coupon],
    by_id: HashMap<u32, usize>,
}

impl<'a> CouponIndex<'a> {
    pub fn new(coupons: &'a [Coupon]) -> Self {
        let mut by_id = HashMap::with_capacity(coupons.len());
        for (pos, coupon) in coupons.iter().enumerate() {
            // First occurrence wins, matching a linear scan.
            by_id.entry(coupon.id).or_insert(pos);
        }
        CouponIndex { coupons, by_id }
    }

    pub fn get(&self, id: u32) -> Option<&'a Coupon> {
        self.by_id.get(&id).map(|&pos| &self.coupons[pos])
    }

    /// Coupons usable for a package, in catalog order.
    pub fn applicable(
        &self,
        package_id: u32,
        date: NaiveDate,
        recurring_context: bool,
    ) -> Vec<&'a Coupon> {
        self.coupons
            .iter()
            .filter(|coupon| coupon.applies(package_id, date, recurring_context))
            .collect()
    }

    /// Coupons usable for a package's options, in catalog order.
    pub fn applicable_to_options(
        &self,
        package_id: u32,
        date: NaiveDate,
        recurring_context: bool,
    ) -> Vec<&'a Coupon> {
        self.coupons
            .iter()
            .filter(|coupon| {
                coupon.applies_to_options && coupon.applies(package_id, date, recurring_context)
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
