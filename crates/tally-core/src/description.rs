//! # Line Item Descriptions
//!
//! Every description is built from exactly one localization key. The key is
//! picked by a [`DescriptionKind`], decided once per line from what the line
//! carries:
//!
//! ```text
//! ┌──────────────────────┬───────────────────┬──────────────────────────────┐
//! │ Kind                 │ Chosen when       │ English rendering            │
//! ├──────────────────────┼───────────────────┼──────────────────────────────┤
//! │ Package              │ no name, full     │ Basic                        │
//! │ Service              │ name, full        │ Basic - example.com          │
//! │ ProratedPackage      │ no name, window   │ Basic (adding Nov 11, 2026   │
//! │                      │                   │        - Dec 1, 2026)        │
//! │ ProratedService      │ name, window      │ Basic - example.com (...)    │
//! │ Option               │ discrete option   │   Location: Frankfurt        │
//! │ OptionQuantity       │ quantity option   │   Extra IPs: 4 x IP          │
//! │ SetupFee             │ setup sub-line    │ Setup Fee: Basic             │
//! │ CancelFee            │ cancel sub-line   │ Cancellation Fee: Basic      │
//! └──────────────────────┴───────────────────┴──────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::fmt::Write;

use crate::locale::Translator;
use crate::proration::{ProrationDirection, ProrationWindow};

/// The template a description is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionKind {
    Package,
    Service,
    ProratedPackage,
    ProratedService,
    Option,
    OptionQuantity,
    SetupFee,
    CancelFee,
}

impl DescriptionKind {
    /// Kind of a package or service item line.
    pub fn for_item(has_service_name: bool, prorated: bool) -> Self {
        match (has_service_name, prorated) {
            (false, false) => DescriptionKind::Package,
            (true, false) => DescriptionKind::Service,
            (false, true) => DescriptionKind::ProratedPackage,
            (true, true) => DescriptionKind::ProratedService,
        }
    }

    /// Kind of an option line.
    pub fn for_option(quantity_mode: bool) -> Self {
        if quantity_mode {
            DescriptionKind::OptionQuantity
        } else {
            DescriptionKind::Option
        }
    }

    /// Localization key of the template.
    pub fn key(self) -> &'static str {
        match self {
            DescriptionKind::Package => "pricing.item.package",
            DescriptionKind::Service => "pricing.item.service",
            DescriptionKind::ProratedPackage => "pricing.item.package_prorated",
            DescriptionKind::ProratedService => "pricing.item.service_prorated",
            DescriptionKind::Option => "pricing.item.option",
            DescriptionKind::OptionQuantity => "pricing.item.option_quantity",
            DescriptionKind::SetupFee => "pricing.item.setup_fee",
            DescriptionKind::CancelFee => "pricing.item.cancel_fee",
        }
    }
}

/// Renders descriptions through a translator.
#[derive(Clone, Copy)]
pub struct Describer<'a> {
    translator: &'a dyn Translator,
    date_format: &'a str,
}

impl<'a> Describer<'a> {
    /// `date_format` must be a valid strftime pattern (checked by
    /// `PricingSettings::validate`).
    pub fn new(translator: &'a dyn Translator, date_format: &'a str) -> Self {
        Describer {
            translator,
            date_format,
        }
    }

    /// Description of a package or service item.
    ///
    /// `window` is given only when the item price was actually prorated.
    pub fn item(
        &self,
        package_name: &str,
        service_name: Option<&str>,
        window: Option<&ProrationWindow>,
    ) -> String {
        let kind = DescriptionKind::for_item(service_name.is_some(), window.is_some());

        let mut args = vec![package_name.to_string()];
        if let Some(name) = service_name {
            args.push(name.to_string());
        }
        if let Some(window) = window {
            args.push(self.direction(window.direction));
            args.push(self.date(window.start));
            args.push(self.date(window.end));
        }

        self.translator.translate(kind.key(), &args)
    }

    /// Description of an option line. `quantity` is set for quantity-mode
    /// options.
    pub fn option(&self, label: &str, value_name: &str, quantity: Option<i64>) -> String {
        let kind = DescriptionKind::for_option(quantity.is_some());
        let args = match quantity {
            Some(units) => vec![label.to_string(), units.to_string(), value_name.to_string()],
            None => vec![label.to_string(), value_name.to_string()],
        };
        self.translator.translate(kind.key(), &args)
    }

    pub fn setup_fee(&self, subject: &str) -> String {
        self.translator
            .translate(DescriptionKind::SetupFee.key(), &[subject.to_string()])
    }

    pub fn cancel_fee(&self, subject: &str) -> String {
        self.translator
            .translate(DescriptionKind::CancelFee.key(), &[subject.to_string()])
    }

    fn direction(&self, direction: ProrationDirection) -> String {
        let key = match direction {
            ProrationDirection::Add => "pricing.direction.add",
            ProrationDirection::Remove => "pricing.direction.remove",
        };
        self.translator.translate(key, &[])
    }

    /// Falls back to ISO dates when the pattern cannot render a date.
    fn date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        match write!(out, "{}", date.format(self.date_format)) {
            Ok(()) => out,
            Err(_) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::EnglishCatalog;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_kind_selection() {
        assert_eq!(DescriptionKind::for_item(false, false), DescriptionKind::Package);
        assert_eq!(DescriptionKind::for_item(true, false), DescriptionKind::Service);
        assert_eq!(DescriptionKind::for_item(false, true), DescriptionKind::ProratedPackage);
        assert_eq!(DescriptionKind::for_item(true, true), DescriptionKind::ProratedService);
        assert_eq!(DescriptionKind::for_option(true), DescriptionKind::OptionQuantity);
    }

    #[test]
    fn test_every_kind_has_distinct_key() {
        let kinds = [
            DescriptionKind::Package,
            DescriptionKind::Service,
            DescriptionKind::ProratedPackage,
            DescriptionKind::ProratedService,
            DescriptionKind::Option,
            DescriptionKind::OptionQuantity,
            DescriptionKind::SetupFee,
            DescriptionKind::CancelFee,
        ];
        let keys: std::collections::HashSet<_> = kinds.iter().map(|k| k.key()).collect();
        assert_eq!(keys.len(), kinds.len());
    }

    #[test]
    fn test_item_descriptions() {
        let describer = Describer::new(&EnglishCatalog, "%b %-d, %Y");
        assert_eq!(describer.item("Basic", None, None), "Basic");
        assert_eq!(describer.item("Basic", Some("example.com"), None), "Basic - example.com");

        let window = ProrationWindow::new(date(2026, 11, 11), date(2026, 12, 1), ProrationDirection::Add);
        assert_eq!(
            describer.item("Basic", None, Some(&window)),
            "Basic (adding Nov 11, 2026 - Dec 1, 2026)"
        );
        assert_eq!(
            describer.item("Basic", Some("example.com"), Some(&window.reversed())),
            "Basic - example.com (removing Nov 11, 2026 - Dec 1, 2026)"
        );
    }

    #[test]
    fn test_option_and_fee_descriptions() {
        let describer = Describer::new(&EnglishCatalog, "%Y-%m-%d");
        assert_eq!(describer.option("Location", "Frankfurt", None), "  Location: Frankfurt");
        assert_eq!(describer.option("Extra IPs", "IP", Some(4)), "  Extra IPs: 4 x IP");
        assert_eq!(describer.setup_fee("Basic"), "Setup Fee: Basic");
        assert_eq!(describer.cancel_fee("Basic"), "Cancellation Fee: Basic");
    }

    #[test]
    fn test_time_pattern_falls_back_to_iso_dates() {
        let describer = Describer::new(&EnglishCatalog, "%Y-%m-%d %H:%M");
        let window = ProrationWindow::new(date(2026, 11, 11), date(2026, 12, 1), ProrationDirection::Add);
        assert_eq!(
            describer.item("Basic", None, Some(&window)),
            "Basic (adding 2026-11-11 - 2026-12-01)"
        );
    }
}
