//! # tally-core: Pricing Presentation Engine
//!
//! Turns a package selection (or an existing service, or a change from one
//! to the other) into a displayable breakdown of charge lines, discount
//! groups and tax groups. Pure computation: no I/O, no persistence.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Caller (cart, invoice preview, tally-preview CLI)        │   │
//! │  │   loads packages, coupons, tax rules, options, settings         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ &[Coupon], &[TaxRule], ...            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   presenter ──► line_item ──► discount / tax ──► aggregate     │   │
//! │  │                    │                                            │   │
//! │  │          proration · options · description                      │   │
//! │  │                    │                                            │   │
//! │  │           money · period · catalog · settings                   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Breakdown (serde / ts-rs)             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 Renderer (invoice, cart UI)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`presenter`] - The three entry operations
//! - [`line_item`] - Item / setup fee / cancel fee sets
//! - [`aggregate`] - Breakdown output and aggregation
//! - [`proration`] - Partial-term pricing
//! - [`discount`] - Coupon eligibility
//! - [`tax`] - Tax rule applicability and grouping
//! - [`options`] - Option input resolution
//! - [`description`] - Description kinds and rendering
//! - [`locale`] / [`exchange`] - Collaborator traits with defaults
//! - [`money`] / [`period`] / [`catalog`] / [`settings`] / [`error`]
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use tally_core::{Catalogs, Package, PackagePricing, Period, PricingPresenter, PricingSettings, Selection};
//!
//! let pricing = PackagePricing {
//!     id: 10,
//!     package_id: 1,
//!     term: 1,
//!     period: Period::Month,
//!     currency: "USD".into(),
//!     price: Decimal::new(1200, 2),
//!     setup_fee: Decimal::ZERO,
//!     cancel_fee: Decimal::ZERO,
//! };
//! let basic = Package {
//!     id: 1,
//!     name: "Basic".into(),
//!     taxable: false,
//!     prorata_day: Some(1),
//!     pricing: vec![pricing.clone()],
//! };
//!
//! let catalogs = Catalogs { tax_rules: &[], coupons: &[], options: &[] };
//! let presenter = PricingPresenter::new(PricingSettings::default(), catalogs).unwrap();
//!
//! let start = NaiveDate::from_ymd_opt(2026, 11, 11).unwrap();
//! let breakdown = presenter.format_selection(&Selection::default(), &basic, &pricing, start);
//!
//! // 20 of 30 days until the 1st
//! assert_eq!(breakdown.items[0].price, Decimal::new(800, 2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod catalog;
pub mod description;
pub mod discount;
pub mod error;
pub mod exchange;
pub mod line_item;
pub mod locale;
pub mod money;
pub mod options;
pub mod period;
pub mod presenter;
pub mod proration;
pub mod settings;
pub mod tax;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregate::{Breakdown, DiscountEntry, PresentedItem, TaxEntry};
pub use catalog::{
    OptionPricing, OptionSelection, OptionValue, Package, PackageOption, PackagePricing, Selection,
    Service,
};
pub use discount::{Coupon, CouponAmount, CouponStatus, DiscountKind};
pub use error::{PricingError, PricingResult, ValidationError};
pub use exchange::{CurrencyConverter, NoConversion, RateTable};
pub use locale::{CodeFormatter, CurrencyFormatter, EnglishCatalog, Translator};
pub use money::Money;
pub use period::{Period, PricingTerm};
pub use presenter::{Catalogs, PricingPresenter};
pub use proration::{ProrationCalculator, ProrationDirection, ProrationWindow};
pub use settings::{MultiCurrencyPricing, PricingSettings, TaxSettings};
pub use tax::{TaxRule, TaxStatus, TaxType};
