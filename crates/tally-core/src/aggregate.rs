//! # Aggregation
//!
//! Turns annotated line item sets into the displayable [`Breakdown`].
//!
//! ## Output Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items      [0] Basic (adding ...)        8.00 USD x1                   │
//! │             [1] Setup Fee: Basic          5.00 USD x1                   │
//! │                                                                         │
//! │  discounts  Coupon SPRING (20%)   percent 20   apply [0]                │
//! │                                                                         │
//! │  taxes      group 0  [ VAT (10%)  apply [0, 1] ]                        │
//! │             group 1  [ City (5%)  apply [0] ]                           │
//! │                                                                         │
//! │  Indices in `apply` point into `items`. Groups and entries appear in   │
//! │  the order they are first referenced.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use ts_rs::TS;

use crate::discount::{CouponIndex, DiscountKind};
use crate::line_item::{LineItem, LineItemSet};
use crate::locale::{CurrencyFormatter, Translator};
use crate::tax::{TaxRuleIndex, TaxType};

// =============================================================================
// Output Types
// =============================================================================

/// One displayable charge line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PresentedItem {
    #[ts(type = "string")]
    pub price: Decimal,
    pub currency: String,
    pub qty: i64,
    pub description: String,
}

/// One coupon and the items it discounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountEntry {
    /// Percentage or fixed amount, depending on `type`.
    #[ts(type = "string")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub description: String,
    pub apply: Vec<usize>,
}

/// One tax rule and the items it taxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxEntry {
    /// Rate in percent.
    #[ts(type = "string")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TaxType,
    pub description: String,
    pub apply: Vec<usize>,
}

/// The complete presentation of a computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Breakdown {
    pub items: Vec<PresentedItem>,
    pub discounts: Vec<DiscountEntry>,
    /// Outer list: independently applied groups. Entries inside one group
    /// compound.
    pub taxes: Vec<Vec<TaxEntry>>,
}

impl Breakdown {
    /// Sum of `price × qty` per currency, before discounts and taxes.
    /// Saturates at the decimal range.
    pub fn subtotal(&self) -> BTreeMap<String, Decimal> {
        let mut totals = BTreeMap::new();
        for item in &self.items {
            let total = totals.entry(item.currency.clone()).or_insert(Decimal::ZERO);
            *total = total.saturating_add(item.price.saturating_mul(Decimal::from(item.qty)));
        }
        totals
    }
}

// =============================================================================
// Aggregation Builder
// =============================================================================

/// Merges line item sets into a [`Breakdown`].
pub struct AggregationBuilder<'a> {
    coupons: &'a CouponIndex<'a>,
    taxes: &'a TaxRuleIndex<'a>,
    translator: &'a dyn Translator,
    formatter: &'a dyn CurrencyFormatter,
}

impl<'a> AggregationBuilder<'a> {
    pub fn new(
        coupons: &'a CouponIndex<'a>,
        taxes: &'a TaxRuleIndex<'a>,
        translator: &'a dyn Translator,
        formatter: &'a dyn CurrencyFormatter,
    ) -> Self {
        AggregationBuilder {
            coupons,
            taxes,
            translator,
            formatter,
        }
    }

    /// Copy of a set with every positive price flipped negative.
    pub fn negate(set: &LineItemSet) -> LineItemSet {
        set.negated()
    }

    pub fn build(&self, sets: &[LineItemSet]) -> Breakdown {
        let mut state = Accumulator::default();

        for line in sets.iter().flat_map(|set| set.lines()) {
            let index = state.breakdown.items.len();
            state.breakdown.items.push(PresentedItem {
                price: line.price.amount(),
                currency: line.price.currency().to_string(),
                qty: line.qty,
                description: line.description.clone(),
            });

            self.mark_discounts(&mut state, line, index);
            self.mark_taxes(&mut state, line, index);
        }

        state.breakdown
    }

    fn mark_discounts(&self, state: &mut Accumulator, line: &LineItem, index: usize) {
        for &coupon_id in &line.coupons {
            if let Some(&pos) = state.discount_pos.get(&coupon_id) {
                let entry = &mut state.breakdown.discounts[pos];
                // The group is priced in its first item's currency.
                if self
                    .coupons
                    .get(coupon_id)
                    .is_some_and(|c| c.amount_for(line.price.currency()).is_some())
                    && !entry.apply.contains(&index)
                {
                    entry.apply.push(index);
                }
                continue;
            }

            let Some(coupon) = self.coupons.get(coupon_id) else {
                debug!(coupon_id, "Unknown coupon, skipping");
                continue;
            };
            let Some(row) = coupon.amount_for(line.price.currency()) else {
                debug!(
                    coupon_id,
                    currency = line.price.currency(),
                    "Coupon has no amount in this currency, skipping"
                );
                continue;
            };

            let shown_amount = match row.kind {
                DiscountKind::Fixed => self.formatter.format(row.amount, line.price.currency()),
                DiscountKind::Percent => self
                    .translator
                    .translate("pricing.discount.percent", &[row.amount.normalize().to_string()]),
            };
            let description = self
                .translator
                .translate("pricing.discount.coupon", &[coupon.code.clone(), shown_amount]);

            state.discount_pos.insert(coupon_id, state.breakdown.discounts.len());
            state.breakdown.discounts.push(DiscountEntry {
                amount: row.amount,
                kind: row.kind,
                description,
                apply: vec![index],
            });
        }
    }

    fn mark_taxes(&self, state: &mut Accumulator, line: &LineItem, index: usize) {
        for group in &line.tax_groups {
            let pos = match state.tax_pos.get(group) {
                Some(pos) => *pos,
                None => {
                    let pos = self.open_tax_group(state, group);
                    state.tax_pos.insert(group.clone(), pos);
                    pos
                }
            };

            // Every rule id of the group was unknown
            let Some(pos) = pos else {
                continue;
            };

            for entry in &mut state.breakdown.taxes[pos] {
                if !entry.apply.contains(&index) {
                    entry.apply.push(index);
                }
            }
        }
    }

    /// Emits a new tax group, one entry per known unique rule id.
    fn open_tax_group(&self, state: &mut Accumulator, group: &[u32]) -> Option<usize> {
        let mut seen = Vec::with_capacity(group.len());
        let mut entries = Vec::with_capacity(group.len());

        for &rule_id in group {
            if seen.contains(&rule_id) {
                continue;
            }
            seen.push(rule_id);

            let Some(rule) = self.taxes.get(rule_id) else {
                debug!(rule_id, "Unknown tax rule, skipping");
                continue;
            };
            entries.push(TaxEntry {
                amount: rule.rate,
                kind: rule.application,
                description: self.translator.translate(
                    "pricing.tax.rule",
                    &[rule.name.clone(), rule.rate.normalize().to_string()],
                ),
                apply: Vec::new(),
            });
        }

        if entries.is_empty() {
            return None;
        }
        state.breakdown.taxes.push(entries);
        Some(state.breakdown.taxes.len() - 1)
    }
}

#[derive(Default)]
struct Accumulator {
    breakdown: Breakdown,
    discount_pos: HashMap<u32, usize>,
    tax_pos: HashMap<Vec<u32>, Option<usize>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::{Coupon, CouponAmount, CouponStatus};
    use crate::locale::{CodeFormatter, EnglishCatalog};
    use crate::money::Money;
    use crate::tax::{TaxRule, TaxStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn coupon(id: u32, kind: DiscountKind, amount: Decimal) -> Coupon {
        Coupon {
            id,
            code: format!("C{id}"),
            status: CouponStatus::Active,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            used_qty: 0,
            max_qty: 0,
            recurring: false,
            limit_recurring: false,
            applies_to_options: false,
            amounts: vec![CouponAmount {
                currency: "USD".to_string(),
                amount,
                kind,
            }],
            package_ids: vec![1],
        }
    }

    fn rule(id: u32, name: &str, rate: Decimal) -> TaxRule {
        TaxRule {
            id,
            name: name.to_string(),
            rate,
            application: TaxType::Exclusive,
            status: TaxStatus::Active,
        }
    }

    fn line(amount: Decimal, currency: &str, description: &str) -> LineItem {
        LineItem::new(Money::new(amount, currency), 1, description)
    }

    #[test]
    fn test_build_items_discounts_and_taxes() {
        let coupons = vec![
            coupon(1, DiscountKind::Percent, dec!(20)),
            coupon(2, DiscountKind::Fixed, dec!(5)),
        ];
        let rules = vec![rule(1, "VAT", dec!(10.00)), rule(2, "City", dec!(5))];
        let coupon_index = CouponIndex::new(&coupons);
        let tax_index = TaxRuleIndex::new(&rules);
        let builder = AggregationBuilder::new(&coupon_index, &tax_index, &EnglishCatalog, &CodeFormatter);

        let mut first = LineItemSet::new(
            line(dec!(12), "USD", "Basic"),
            Some(line(dec!(5), "USD", "Setup Fee: Basic")),
            None,
        );
        first.item.coupons = vec![1, 2, 99];
        first.item.tax_groups = vec![vec![1], vec![2]];
        first.setup.as_mut().unwrap().tax_groups = vec![vec![1]];

        let mut second = LineItemSet::new(line(dec!(3), "USD", "  IPs: 1 x IP"), None, None);
        second.item.coupons = vec![1];

        let breakdown = builder.build(&[first, second]);

        assert_eq!(breakdown.items.len(), 3);
        assert_eq!(breakdown.items[2].description, "  IPs: 1 x IP");

        assert_eq!(breakdown.discounts.len(), 2);
        assert_eq!(breakdown.discounts[0].description, "Coupon C1 (20%)");
        assert_eq!(breakdown.discounts[0].apply, vec![0, 2]);
        assert_eq!(breakdown.discounts[1].kind, DiscountKind::Fixed);
        assert_eq!(breakdown.discounts[1].description, "Coupon C2 (5.00 USD)");
        assert_eq!(breakdown.discounts[1].apply, vec![0]);

        assert_eq!(breakdown.taxes.len(), 2);
        assert_eq!(breakdown.taxes[0][0].description, "VAT (10%)");
        assert_eq!(breakdown.taxes[0][0].apply, vec![0, 1]);
        assert_eq!(breakdown.taxes[1][0].apply, vec![0]);
    }

    #[test]
    fn test_coupon_without_currency_row_is_skipped() {
        let coupons = vec![coupon(1, DiscountKind::Percent, dec!(20))];
        let rules: Vec<TaxRule> = Vec::new();
        let coupon_index = CouponIndex::new(&coupons);
        let tax_index = TaxRuleIndex::new(&rules);
        let builder = AggregationBuilder::new(&coupon_index, &tax_index, &EnglishCatalog, &CodeFormatter);

        let mut set = LineItemSet::new(line(dec!(10), "EUR", "Basic"), None, None);
        set.item.coupons = vec![1];

        assert!(builder.build(&[set]).discounts.is_empty());
    }

    #[test]
    fn test_cascading_group_and_unknown_rules() {
        let rules = vec![rule(1, "A", dec!(10)), rule(2, "B", dec!(5))];
        let coupons: Vec<Coupon> = Vec::new();
        let coupon_index = CouponIndex::new(&coupons);
        let tax_index = TaxRuleIndex::new(&rules);
        let builder = AggregationBuilder::new(&coupon_index, &tax_index, &EnglishCatalog, &CodeFormatter);

        let mut set = LineItemSet::new(line(dec!(100), "USD", "Basic"), None, None);
        set.item.tax_groups = vec![vec![1, 2, 1], vec![42]];

        let breakdown = builder.build(&[set]);
        assert_eq!(breakdown.taxes.len(), 1);
        let names: Vec<&str> = breakdown.taxes[0].iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["A (10%)", "B (5%)"]);
    }

    #[test]
    fn test_subtotal_per_currency() {
        let breakdown = Breakdown {
            items: vec![
                PresentedItem {
                    price: dec!(12),
                    currency: "USD".to_string(),
                    qty: 2,
                    description: String::new(),
                },
                PresentedItem {
                    price: dec!(-10),
                    currency: "USD".to_string(),
                    qty: 1,
                    description: String::new(),
                },
            ],
            ..Breakdown::default()
        };
        assert_eq!(breakdown.subtotal().get("USD"), Some(&dec!(14)));
    }

    #[test]
    fn test_breakdown_json_shape() {
        let breakdown = Breakdown {
            discounts: vec![DiscountEntry {
                amount: dec!(20),
                kind: DiscountKind::Percent,
                description: "Coupon C1 (20%)".to_string(),
                apply: vec![0],
            }],
            ..Breakdown::default()
        };
        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["discounts"][0]["type"], "percent");
        assert_eq!(json["discounts"][0]["amount"], "20");
        assert!(json["taxes"].as_array().unwrap().is_empty());
    }
}
