//! # Pricing Presenter
//!
//! Entry point of the engine. Three operations produce a [`Breakdown`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  format_service          existing service, full term                   │
//! │  format_selection        new package, prorated to the package's        │
//! │                          pro-rata day when it has one                  │
//! │  format_service_change   old service credited (negated) + new package  │
//! │                          charged, both prorated up to the renew date   │
//! │                                                                         │
//! │  Pipeline per operation:                                               │
//! │    build sets → mark discounts → mark taxes → strip fees → aggregate   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The presenter only holds read-only references to its catalogs, so one
//! instance can serve concurrent calls.

use chrono::NaiveDate;
use tracing::{debug, debug_span};

use crate::aggregate::{AggregationBuilder, Breakdown};
use crate::catalog::{Package, PackageOption, PackagePricing, Selection, Service};
use crate::description::Describer;
use crate::discount::{Coupon, CouponIndex};
use crate::error::PricingResult;
use crate::exchange::{CurrencyConverter, NoConversion};
use crate::line_item::{LineItemBuilder, LineItemSet};
use crate::locale::{CodeFormatter, CurrencyFormatter, EnglishCatalog, Translator};
use crate::options::OptionCatalog;
use crate::proration::{ProrationCalculator, ProrationDirection, ProrationWindow};
use crate::settings::PricingSettings;
use crate::tax::{resolve_tax_groups, TaxRule, TaxRuleIndex};

static ENGLISH: EnglishCatalog = EnglishCatalog;
static CODE_FORMATTER: CodeFormatter = CodeFormatter;
static NO_CONVERSION: NoConversion = NoConversion;

/// Read-only catalogs a presenter prices against.
#[derive(Debug, Clone, Copy)]
pub struct Catalogs<'a> {
    pub tax_rules: &'a [TaxRule],
    pub coupons: &'a [Coupon],
    pub options: &'a [PackageOption],
}

/// Formats services and selections into breakdowns.
pub struct PricingPresenter<'a> {
    settings: PricingSettings,
    coupons: CouponIndex<'a>,
    taxes: TaxRuleIndex<'a>,
    options: OptionCatalog<'a>,
    calculator: ProrationCalculator,
    translator: &'a dyn Translator,
    formatter: &'a dyn CurrencyFormatter,
    converter: &'a dyn CurrencyConverter,
}

impl<'a> PricingPresenter<'a> {
    /// Creates a presenter with English descriptions and no currency
    /// conversion. Fails if the settings are invalid.
    pub fn new(settings: PricingSettings, catalogs: Catalogs<'a>) -> PricingResult<Self> {
        settings.validate()?;

        Ok(PricingPresenter {
            calculator: ProrationCalculator::with_periods(&settings.proratable_periods),
            settings,
            coupons: CouponIndex::new(catalogs.coupons),
            taxes: TaxRuleIndex::new(catalogs.tax_rules),
            options: OptionCatalog::new(catalogs.options),
            translator: &ENGLISH,
            formatter: &CODE_FORMATTER,
            converter: &NO_CONVERSION,
        })
    }

    pub fn with_translator(mut self, translator: &'a dyn Translator) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_formatter(mut self, formatter: &'a dyn CurrencyFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_converter(mut self, converter: &'a dyn CurrencyConverter) -> Self {
        self.converter = converter;
        self
    }

    pub fn settings(&self) -> &PricingSettings {
        &self.settings
    }

    // =========================================================================
    // Entry Operations
    // =========================================================================

    /// Breakdown of an existing service at its full term price.
    pub fn format_service(&self, service: &Service, date: NaiveDate) -> Breakdown {
        let _span = debug_span!("format_service", service_id = service.id).entered();

        let sets = self.line_items().for_existing_service(service, None);
        let sets = self
            .annotate(sets, &service.package, date)
            .into_iter()
            .map(LineItemSet::without_zero_fees)
            .collect::<Vec<_>>();

        self.aggregate(&sets)
    }

    /// Breakdown of a prospective package selection starting on `date`.
    ///
    /// Packages with a pro-rata day are prorated up to its next occurrence.
    pub fn format_selection(
        &self,
        selection: &Selection,
        package: &Package,
        pricing: &PackagePricing,
        date: NaiveDate,
    ) -> Breakdown {
        let _span = debug_span!("format_selection", package_id = package.id, pricing_id = pricing.id)
            .entered();

        let window = package
            .prorata_day
            .and_then(|day| ProrationWindow::until_anchor(date, day, ProrationDirection::Add));
        if package.prorata_day.is_some() && window.is_none() {
            debug!(prorata_day = ?package.prorata_day, "Unusable pro-rata day, charging full term");
        }

        let sets = self
            .line_items()
            .for_selection(selection, package, pricing, window.as_ref());
        let sets = self
            .annotate(sets, package, date)
            .into_iter()
            .map(LineItemSet::without_zero_fees)
            .collect::<Vec<_>>();

        self.aggregate(&sets)
    }

    /// Breakdown of changing `service` to a new package and pricing on `date`.
    ///
    /// The old service is credited (negated, without its setup fee) and the
    /// new selection charged. Both are prorated from `date` to the service's
    /// renew date when that date lies ahead.
    pub fn format_service_change(
        &self,
        service: &Service,
        selection: &Selection,
        package: &Package,
        pricing: &PackagePricing,
        date: NaiveDate,
    ) -> Breakdown {
        let _span = debug_span!(
            "format_service_change",
            service_id = service.id,
            package_id = package.id,
            pricing_id = pricing.id
        )
        .entered();

        let window = service
            .renew_date
            .filter(|renew| *renew > date)
            .map(|renew| ProrationWindow::new(date, renew, ProrationDirection::Add));
        let removal = window.as_ref().map(ProrationWindow::reversed);

        let builder = self.line_items();

        let old_sets = builder.for_existing_service(service, removal.as_ref());
        let old_sets = self
            .annotate(old_sets, &service.package, date)
            .into_iter()
            .map(|set| AggregationBuilder::negate(&set).without_setup().without_zero_fees());

        let new_sets = builder.for_selection(selection, package, pricing, window.as_ref());
        let new_sets = self
            .annotate(new_sets, package, date)
            .into_iter()
            .map(LineItemSet::without_zero_fees);

        let sets: Vec<LineItemSet> = old_sets.chain(new_sets).collect();
        self.aggregate(&sets)
    }

    // =========================================================================
    // Pipeline Steps
    // =========================================================================

    fn line_items(&self) -> LineItemBuilder<'_> {
        LineItemBuilder::new(
            &self.calculator,
            Describer::new(self.translator, &self.settings.date_format),
            &self.options,
            self.converter,
            self.settings.multi_currency_pricing,
        )
    }

    /// Marks coupons, then taxes. The first set is the package; the rest are
    /// its options.
    fn annotate(&self, mut sets: Vec<LineItemSet>, package: &Package, date: NaiveDate) -> Vec<LineItemSet> {
        let recurring = self.settings.recur;

        let package_coupons: Vec<u32> = self
            .coupons
            .applicable(package.id, date, recurring)
            .iter()
            .map(|coupon| coupon.id)
            .collect();
        let option_coupons: Vec<u32> = self
            .coupons
            .applicable_to_options(package.id, date, recurring)
            .iter()
            .map(|coupon| coupon.id)
            .collect();

        for (pos, set) in sets.iter_mut().enumerate() {
            if pos == 0 {
                set.apply_coupons(&package_coupons);
            } else {
                set.apply_coupons(&option_coupons);
            }
        }

        let assignment = resolve_tax_groups(&self.settings.tax, self.taxes.rules(), package.taxable);
        for set in &mut sets {
            set.apply_taxes(&assignment);
        }

        sets
    }

    fn aggregate(&self, sets: &[LineItemSet]) -> Breakdown {
        AggregationBuilder::new(&self.coupons, &self.taxes, self.translator, self.formatter).build(sets)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
