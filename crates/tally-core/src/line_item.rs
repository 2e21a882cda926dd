//! # Line Items
//!
//! Every service, package selection and option becomes one [`LineItemSet`]:
//! the recurring item plus its optional one-time fees.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LineItemSet                                                            │
//! │   ├── item    Basic (adding Nov 11, 2026 - Dec 1, 2026)   8.00 USD x1  │
//! │   ├── setup   Setup Fee: Basic                            5.00 USD x1  │
//! │   └── cancel  (existing services only)                                  │
//! │                                                                         │
//! │  All three lines share one currency.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the recurring item is prorated; fees are charged in full.

use tracing::debug;

use crate::catalog::{OptionPricing, OptionSelection, Package, PackagePricing, Selection, Service};
use crate::description::Describer;
use crate::exchange::CurrencyConverter;
use crate::money::Money;
use crate::options::{OptionCatalog, ResolvedOption};
use crate::period::PricingTerm;
use crate::proration::{ProrationCalculator, ProrationWindow};
use crate::settings::MultiCurrencyPricing;
use crate::tax::{TaxAssignment, TaxGroups};

// =============================================================================
// Line Item
// =============================================================================

/// One priced line before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub price: Money,
    pub qty: i64,
    pub description: String,
    pub tax_groups: TaxGroups,
    /// Ids of coupons discounting this line.
    pub coupons: Vec<u32>,
}

impl LineItem {
    /// Creates an unannotated line. A negative quantity is a caller bug.
    pub fn new(price: Money, qty: i64, description: impl Into<String>) -> Self {
        assert!(qty >= 0, "line item quantity must not be negative, got {qty}");
        LineItem {
            price,
            qty,
            description: description.into(),
            tax_groups: Vec::new(),
            coupons: Vec::new(),
        }
    }

    fn negated(&self) -> Self {
        LineItem {
            price: self.price.negated_if_positive(),
            ..self.clone()
        }
    }
}

// =============================================================================
// Line Item Set
// =============================================================================

/// A recurring item with its optional setup and cancellation fee lines.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemSet {
    pub item: LineItem,
    pub setup: Option<LineItem>,
    pub cancel: Option<LineItem>,
}

impl LineItemSet {
    /// Creates a set. All lines must share the item's currency.
    pub fn new(item: LineItem, setup: Option<LineItem>, cancel: Option<LineItem>) -> Self {
        for fee in setup.iter().chain(cancel.iter()) {
            assert!(
                fee.price.same_currency(&item.price),
                "line item set mixes {} and {}",
                item.price.currency(),
                fee.price.currency()
            );
        }
        LineItemSet { item, setup, cancel }
    }

    /// Attaches coupon ids to the recurring item. Fees are never discounted.
    pub fn apply_coupons(&mut self, coupon_ids: &[u32]) {
        self.item.coupons = coupon_ids.to_vec();
    }

    /// Attaches tax groups to each line.
    pub fn apply_taxes(&mut self, assignment: &TaxAssignment) {
        self.item.tax_groups = assignment.item.clone();
        if let Some(setup) = self.setup.as_mut() {
            setup.tax_groups = assignment.setup.clone();
        }
        if let Some(cancel) = self.cancel.as_mut() {
            cancel.tax_groups = assignment.cancel.clone();
        }
    }

    /// Drops fee lines that charge nothing.
    pub fn without_zero_fees(mut self) -> Self {
        self.setup = self.setup.filter(|line| !line.price.is_zero());
        self.cancel = self.cancel.filter(|line| !line.price.is_zero());
        self
    }

    /// Drops the setup fee line.
    pub fn without_setup(mut self) -> Self {
        self.setup = None;
        self
    }

    /// Copy with every positive price flipped negative. Quantities,
    /// descriptions and annotations are kept.
    pub fn negated(&self) -> Self {
        LineItemSet {
            item: self.item.negated(),
            setup: self.setup.as_ref().map(LineItem::negated),
            cancel: self.cancel.as_ref().map(LineItem::negated),
        }
    }

    /// Lines in output order: item, setup if nonzero, cancel.
    pub fn lines(&self) -> impl Iterator<Item = &LineItem> {
        std::iter::once(&self.item)
            .chain(self.setup.iter().filter(|line| !line.price.is_zero()))
            .chain(self.cancel.iter())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Whether a set describes something the customer already has or something
/// being added. Only existing services surface a cancellation fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Existing,
    Prospective,
}

/// Builds line item sets for services, selections and options.
pub struct LineItemBuilder<'a> {
    calculator: &'a ProrationCalculator,
    describer: Describer<'a>,
    options: &'a OptionCatalog<'a>,
    converter: &'a dyn CurrencyConverter,
    multi_currency: MultiCurrencyPricing,
}

impl<'a> LineItemBuilder<'a> {
    pub fn new(
        calculator: &'a ProrationCalculator,
        describer: Describer<'a>,
        options: &'a OptionCatalog<'a>,
        converter: &'a dyn CurrencyConverter,
        multi_currency: MultiCurrencyPricing,
    ) -> Self {
        LineItemBuilder {
            calculator,
            describer,
            options,
            converter,
            multi_currency,
        }
    }

    /// Sets for an existing service: the package set first, then one per
    /// priced option.
    pub fn for_existing_service(
        &self,
        service: &Service,
        window: Option<&ProrationWindow>,
    ) -> Vec<LineItemSet> {
        let base_price = service
            .override_price
            .clone()
            .unwrap_or_else(|| service.pricing.price());

        let mut sets = vec![self.package_set(
            &service.package,
            &service.pricing,
            base_price,
            service.qty,
            service.name.as_deref(),
            window,
            Origin::Existing,
        )];
        sets.extend(self.options_for(
            &service.options,
            &service.pricing,
            service.qty,
            window,
            Origin::Existing,
        ));
        sets
    }

    /// Sets for a prospective selection. Never carries a cancellation fee.
    pub fn for_selection(
        &self,
        selection: &Selection,
        package: &Package,
        pricing: &PackagePricing,
        window: Option<&ProrationWindow>,
    ) -> Vec<LineItemSet> {
        let base_price = selection
            .override_price
            .clone()
            .unwrap_or_else(|| pricing.price());
        let qty = selection.qty.unwrap_or(1);

        let mut sets = vec![self.package_set(
            package,
            pricing,
            base_price,
            qty,
            selection.name.as_deref(),
            window,
            Origin::Prospective,
        )];
        sets.extend(self.options_for(&selection.options, pricing, qty, window, Origin::Prospective));
        sets
    }

    /// Set for one option, priced for the package's term and currency.
    ///
    /// Returns `None` when the option is unknown, unwanted (quantity zero),
    /// unreadable, too large for its parent quantity, or has no usable price
    /// row.
    pub fn for_option(
        &self,
        selection: &OptionSelection,
        term: PricingTerm,
        currency: &str,
        parent_qty: i64,
        window: Option<&ProrationWindow>,
        origin: Origin,
    ) -> Option<LineItemSet> {
        let resolved = self.options.resolve(selection)?;
        let row = self.option_price(&resolved, term, currency)?;

        let Some(qty) = resolved.quantity.unwrap_or(1).checked_mul(parent_qty) else {
            debug!(
                option_id = resolved.option.id,
                units = resolved.quantity,
                parent_qty,
                "Option quantity overflows, skipping"
            );
            return None;
        };
        let description =
            self.describer
                .option(&resolved.option.label, &resolved.value.name, resolved.quantity);

        let price = match self.prorating(term, window) {
            Some(window) => self.calculator.prorate_window(&row.price, term, window),
            None => row.price.clone(),
        };

        let setup = LineItem::new(
            row.setup_fee,
            qty,
            self.describer.setup_fee(&resolved.option.label),
        );
        let cancel = match origin {
            Origin::Existing => Some(LineItem::new(
                row.cancel_fee,
                qty,
                self.describer.cancel_fee(&resolved.option.label),
            )),
            Origin::Prospective => None,
        };

        Some(LineItemSet::new(
            LineItem::new(price, qty, description),
            Some(setup),
            cancel,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn package_set(
        &self,
        package: &Package,
        pricing: &PackagePricing,
        base_price: Money,
        qty: i64,
        service_name: Option<&str>,
        window: Option<&ProrationWindow>,
        origin: Origin,
    ) -> LineItemSet {
        let term = pricing.pricing_term();
        let prorating = self.prorating(term, window);

        let price = match prorating {
            Some(window) => self.calculator.prorate_window(&base_price, term, window),
            None => base_price,
        };
        let description = self.describer.item(&package.name, service_name, prorating);

        let setup = LineItem::new(pricing.setup_fee(), qty, self.describer.setup_fee(&package.name));
        let cancel = match origin {
            Origin::Existing => Some(LineItem::new(
                pricing.cancel_fee(),
                qty,
                self.describer.cancel_fee(&package.name),
            )),
            Origin::Prospective => None,
        };

        LineItemSet::new(LineItem::new(price, qty, description), Some(setup), cancel)
    }

    fn options_for(
        &self,
        selections: &[OptionSelection],
        pricing: &PackagePricing,
        parent_qty: i64,
        window: Option<&ProrationWindow>,
        origin: Origin,
    ) -> Vec<LineItemSet> {
        let term = pricing.pricing_term();
        selections
            .iter()
            .filter_map(|selection| {
                self.for_option(selection, term, &pricing.currency, parent_qty, window, origin)
            })
            .collect()
    }

    /// The window, if the term is actually prorated over it.
    fn prorating<'w>(
        &self,
        term: PricingTerm,
        window: Option<&'w ProrationWindow>,
    ) -> Option<&'w ProrationWindow> {
        window.filter(|_| self.calculator.is_proratable(term.period))
    }

    /// Price row for an option value in the package's currency.
    ///
    /// Falls back to converting a row in another currency when settings
    /// allow exchange-rate pricing.
    fn option_price(&self, resolved: &ResolvedOption<'_>, term: PricingTerm, currency: &str) -> Option<OptionAmounts> {
        let rows = &resolved.value.pricing;

        if let Some(row) = rows
            .iter()
            .find(|row| row.matches_term(term) && row.currency.eq_ignore_ascii_case(currency))
        {
            return Some(OptionAmounts::from_row(row));
        }

        if self.multi_currency == MultiCurrencyPricing::Package {
            debug!(
                option_id = resolved.option.id,
                term = %term,
                currency,
                "No option price for this term and currency, skipping"
            );
            return None;
        }

        let converted = rows
            .iter()
            .filter(|row| row.matches_term(term))
            .find_map(|row| OptionAmounts::from_row(row).convert(self.converter, currency));
        if converted.is_none() {
            debug!(
                option_id = resolved.option.id,
                term = %term,
                currency,
                "No convertible option price, skipping"
            );
        }
        converted
    }
}

/// The three amounts of an option price row.
struct OptionAmounts {
    price: Money,
    setup_fee: Money,
    cancel_fee: Money,
}

impl OptionAmounts {
    fn from_row(row: &OptionPricing) -> Self {
        OptionAmounts {
            price: Money::new(row.price, &row.currency),
            setup_fee: Money::new(row.setup_fee, &row.currency),
            cancel_fee: Money::new(row.cancel_fee, &row.currency),
        }
    }

    fn convert(&self, converter: &dyn CurrencyConverter, to: &str) -> Option<Self> {
        Some(OptionAmounts {
            price: converter.convert(&self.price, to)?.round_currency(),
            setup_fee: converter.convert(&self.setup_fee, to)?.round_currency(),
            cancel_fee: converter.convert(&self.cancel_fee, to)?.round_currency(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OptionValue, PackageOption};
    use crate::exchange::{NoConversion, RateTable};
    use crate::locale::EnglishCatalog;
    use crate::period::Period;
    use crate::proration::ProrationDirection;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, "USD")
    }

    fn pricing() -> PackagePricing {
        PackagePricing {
            id: 10,
            package_id: 1,
            term: 1,
            period: Period::Month,
            currency: "USD".to_string(),
            price: dec!(12.00),
            setup_fee: dec!(5.00),
            cancel_fee: dec!(3.00),
        }
    }

    fn package() -> Package {
        Package {
            id: 1,
            name: "Basic".to_string(),
            taxable: true,
            prorata_day: Some(1),
            pricing: vec![pricing()],
        }
    }

    fn option_catalog() -> Vec<PackageOption> {
        vec![PackageOption {
            id: 3,
            label: "Extra IPs".to_string(),
            quantity_mode: true,
            values: vec![OptionValue {
                value: "ip".to_string(),
                name: "IP".to_string(),
                pricing: vec![OptionPricing {
                    term: 1,
                    period: Period::Month,
                    currency: "EUR".to_string(),
                    price: dec!(2.00),
                    setup_fee: dec!(1.00),
                    cancel_fee: dec!(0),
                }],
            }],
        }]
    }

    fn selection() -> Selection {
        Selection {
            options: vec![OptionSelection {
                option_id: 3,
                value: json!(2),
            }],
            ..Selection::default()
        }
    }

    #[test]
    fn test_selection_without_window() {
        let calc = ProrationCalculator::default();
        let options = option_catalog();
        let catalog = OptionCatalog::new(&options);
        let builder = LineItemBuilder::new(
            &calc,
            Describer::new(&EnglishCatalog, "%b %-d, %Y"),
            &catalog,
            &NoConversion,
            MultiCurrencyPricing::Package,
        );

        let sets = builder.for_selection(&selection(), &package(), &pricing(), None);
        // Option has no USD row and package mode never converts
        assert_eq!(sets.len(), 1);
        let set = &sets[0];
        assert_eq!(set.item.price, usd(dec!(12.00)));
        assert_eq!(set.item.qty, 1);
        assert_eq!(set.item.description, "Basic");
        assert_eq!(set.setup.as_ref().map(|s| s.price.clone()), Some(usd(dec!(5.00))));
        assert!(set.cancel.is_none());
    }

    #[test]
    fn test_selection_with_window_is_prorated() {
        let calc = ProrationCalculator::default();
        let options = option_catalog();
        let catalog = OptionCatalog::new(&options);
        let builder = LineItemBuilder::new(
            &calc,
            Describer::new(&EnglishCatalog, "%b %-d, %Y"),
            &catalog,
            &NoConversion,
            MultiCurrencyPricing::Package,
        );
        let window =
            ProrationWindow::until_anchor(date(2026, 11, 11), 1, ProrationDirection::Add).unwrap();

        let sets = builder.for_selection(&Selection::default(), &package(), &pricing(), Some(&window));
        assert_eq!(sets[0].item.price, usd(dec!(8.00)));
        assert_eq!(sets[0].item.description, "Basic (adding Nov 11, 2026 - Dec 1, 2026)");
        // Fees are not prorated
        assert_eq!(sets[0].setup.as_ref().map(|s| s.price.amount()), Some(dec!(5.00)));
    }

    #[test]
    fn test_existing_service_has_cancel_line_and_override() {
        let calc = ProrationCalculator::default();
        let options = option_catalog();
        let catalog = OptionCatalog::new(&options);
        let builder = LineItemBuilder::new(
            &calc,
            Describer::new(&EnglishCatalog, "%b %-d, %Y"),
            &catalog,
            &NoConversion,
            MultiCurrencyPricing::Package,
        );
        let service = Service {
            id: 77,
            name: Some("example.com".to_string()),
            package: package(),
            pricing: pricing(),
            override_price: Some(usd(dec!(9.00))),
            qty: 2,
            options: Vec::new(),
            renew_date: None,
        };

        let sets = builder.for_existing_service(&service, None);
        assert_eq!(sets[0].item.price, usd(dec!(9.00)));
        assert_eq!(sets[0].item.qty, 2);
        assert_eq!(sets[0].item.description, "Basic - example.com");
        assert_eq!(sets[0].cancel.as_ref().map(|c| c.price.amount()), Some(dec!(3.00)));
    }

    #[test]
    fn test_option_converted_with_exchange_rate() {
        let calc = ProrationCalculator::default();
        let options = option_catalog();
        let catalog = OptionCatalog::new(&options);
        let rates = RateTable::new("EUR").with_rate("USD", dec!(1.5));
        let builder = LineItemBuilder::new(
            &calc,
            Describer::new(&EnglishCatalog, "%b %-d, %Y"),
            &catalog,
            &rates,
            MultiCurrencyPricing::ExchangeRate,
        );

        let sets = builder.for_selection(&selection(), &package(), &pricing(), None);
        assert_eq!(sets.len(), 2);
        let option = &sets[1];
        assert_eq!(option.item.price, usd(dec!(3.00)));
        assert_eq!(option.item.qty, 2);
        assert_eq!(option.item.description, "  Extra IPs: 2 x IP");
        assert_eq!(option.setup.as_ref().map(|s| s.price.amount()), Some(dec!(1.50)));
    }

    #[test]
    fn test_option_quantity_overflow_is_skipped() {
        let calc = ProrationCalculator::default();
        let options = option_catalog();
        let catalog = OptionCatalog::new(&options);
        let rates = RateTable::new("EUR").with_rate("USD", dec!(1.5));
        let builder = LineItemBuilder::new(
            &calc,
            Describer::new(&EnglishCatalog, "%b %-d, %Y"),
            &catalog,
            &rates,
            MultiCurrencyPricing::ExchangeRate,
        );
        let selection = Selection {
            qty: Some(2),
            options: vec![OptionSelection {
                option_id: 3,
                value: json!("9223372036854775807"),
            }],
            ..Selection::default()
        };

        let sets = builder.for_selection(&selection, &package(), &pricing(), None);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].item.qty, 2);
    }

    #[test]
    fn test_negated_flips_only_positive_prices() {
        let set = LineItemSet::new(
            LineItem::new(usd(dec!(10)), 1, "a"),
            Some(LineItem::new(usd(dec!(0)), 1, "b")),
            Some(LineItem::new(usd(dec!(-2)), 1, "c")),
        );
        let negated = set.negated();
        assert_eq!(negated.item.price.amount(), dec!(-10));
        assert_eq!(negated.setup.as_ref().map(|l| l.price.amount()), Some(dec!(0)));
        assert_eq!(negated.cancel.as_ref().map(|l| l.price.amount()), Some(dec!(-2)));
        assert_eq!(negated.item.description, "a");
    }

    #[test]
    fn test_strip_zero_fees_and_line_order() {
        let set = LineItemSet::new(
            LineItem::new(usd(dec!(10)), 1, "item"),
            Some(LineItem::new(usd(dec!(0)), 1, "setup")),
            Some(LineItem::new(usd(dec!(4)), 1, "cancel")),
        );
        let order: Vec<&str> = set.lines().map(|l| l.description.as_str()).collect();
        assert_eq!(order, vec!["item", "cancel"]);

        let stripped = set.without_zero_fees();
        assert!(stripped.setup.is_none());
        assert!(stripped.cancel.is_some());
    }

    #[test]
    #[should_panic(expected = "line item set mixes USD and EUR")]
    fn test_mixed_currency_set_panics() {
        LineItemSet::new(
            LineItem::new(usd(dec!(10)), 1, "item"),
            Some(LineItem::new(Money::new(dec!(1), "EUR"), 1, "setup")),
            None,
        );
    }

    #[test]
    #[should_panic(expected = "must not be negative")]
    fn test_negative_quantity_panics() {
        LineItem::new(usd(dec!(1)), -1, "item");
    }
}
