//! # Tax Applicability
//!
//! Decides which tax rules apply to a package's item, setup fee and
//! cancellation fee, and how they are grouped.
//!
//! ## Cascading vs. Independent Taxes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rules: A = 10%, B = 5%, base = 100.00                                  │
//! │                                                                         │
//! │  cascade_tax = true   →  groups [[A, B]]                                │
//! │      A on 100.00            = 10.00                                     │
//! │      B on 110.00 (taxed)    =  5.50                                     │
//! │                                                                         │
//! │  cascade_tax = false  →  groups [[A], [B]]                              │
//! │      A on 100.00            = 10.00                                     │
//! │      B on 100.00            =  5.00                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine only assigns groups; the renderer computes tax amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::settings::TaxSettings;

/// Tax rule ids grouped for application. Rules inside one group compound;
/// separate groups are computed independently on the base amount.
pub type TaxGroups = Vec<Vec<u32>>;

// =============================================================================
// Tax Rule
// =============================================================================

/// Whether a rule's tax is included in the price or added on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    Inclusive,
    #[default]
    Exclusive,
}

/// Tax rule status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxStatus {
    #[default]
    Active,
    Inactive,
}

/// A tax rule applicable to the customer's location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRule {
    pub id: u32,
    pub name: String,
    /// Rate in percent (8.25 = 8.25%).
    pub rate: Decimal,
    #[serde(default, rename = "type")]
    pub application: TaxType,
    #[serde(default)]
    pub status: TaxStatus,
}

// =============================================================================
// Tax Assignment
// =============================================================================

/// Tax groups for each line of a line item set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxAssignment {
    pub item: TaxGroups,
    pub setup: TaxGroups,
    pub cancel: TaxGroups,
}

impl TaxAssignment {
    pub fn is_empty(&self) -> bool {
        self.item.is_empty() && self.setup.is_empty() && self.cancel.is_empty()
    }
}

/// Resolves tax groups for a package.
///
/// Returns an empty assignment unless tax is enabled, the customer is not
/// exempt, and the package is taxable. Inactive rules never apply.
pub fn resolve_tax_groups(settings: &TaxSettings, rules: &[TaxRule], taxable: bool) -> TaxAssignment {
    if !settings.taxes_apply() || !taxable {
        return TaxAssignment::default();
    }

    let ids: Vec<u32> = rules
        .iter()
        .filter(|rule| rule.status == TaxStatus::Active)
        .map(|rule| rule.id)
        .collect();

    if ids.is_empty() {
        return TaxAssignment::default();
    }

    let groups: TaxGroups = if settings.cascade_tax {
        vec![ids]
    } else {
        ids.into_iter().map(|id| vec![id]).collect()
    };

    TaxAssignment {
        setup: if settings.setup_fee_tax { groups.clone() } else { Vec::new() },
        cancel: if settings.cancelation_fee_tax { groups.clone() } else { Vec::new() },
        item: groups,
    }
}

// =============================================================================
// Tax Rule Index
// =============================================================================

/// The tax rule catalog with an id lookup table.
#[derive(Debug, Clone)]
pub struct TaxRuleIndex<'a> {
    rules: &'a [TaxRule],
    by_id: HashMap<u32, usize>,
}

impl<'a> TaxRuleIndex<'a> {
    pub fn new(rules: &'a [TaxRule]) -> Self {
        let mut by_id = HashMap::with_capacity(rules.len());
        for (pos, rule) in rules.iter().enumerate() {
            by_id.entry(rule.id).or_insert(pos);
        }
        TaxRuleIndex { rules, by_id }
    }

    pub fn get(&self, id: u32) -> Option<&'a TaxRule> {
        self.by_id.get(&id).map(|&pos| &self.rules[pos])
    }

    pub fn rules(&self) -> &'a [TaxRule] {
        self.rules
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
