//! # Localization Collaborators
//!
//! The engine never owns display strings. Descriptions are produced by a
//! [`Translator`] (key + positional arguments → text) and amounts shown inside
//! descriptions by a [`CurrencyFormatter`].
//!
//! [`EnglishCatalog`] and [`CodeFormatter`] are ready-made defaults used by
//! the preview app and the tests.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::money::CURRENCY_DECIMAL_PLACES;

// =============================================================================
// Traits
// =============================================================================

/// Localized string lookup.
///
/// Templates use positional placeholders: `{0}`, `{1}`, ...
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, args: &[String]) -> String;
}

/// Formats an amount for display in a given currency.
pub trait CurrencyFormatter: Send + Sync {
    fn format(&self, amount: Decimal, currency: &str) -> String;
}

// =============================================================================
// Placeholder Substitution
// =============================================================================

/// Replaces `{n}` placeholders in a template with `args[n]`.
///
/// Substitution is single-pass: text inside an argument is never expanded.
/// Placeholders without a matching argument are left as written.
///
/// ## Example
/// ```rust
/// use tally_core::locale::fill_template;
///
/// let text = fill_template("{0} - {1}", &["Basic".to_string(), "example.com".to_string()]);
/// assert_eq!(text, "Basic - example.com");
/// ```
pub fn fill_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            args.get(index).map(|arg| (arg, close))
        });

        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

// =============================================================================
// English Defaults
// =============================================================================

/// Built-in English templates for every key the engine uses.
///
/// Unknown keys translate to the key itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl EnglishCatalog {
    fn template(key: &str) -> Option<&'static str> {
        let template = match key {
            "pricing.item.package" => "{0}",
            "pricing.item.service" => "{0} - {1}",
            "pricing.item.package_prorated" => "{0} ({1} {2} - {3})",
            "pricing.item.service_prorated" => "{0} - {1} ({2} {3} - {4})",
            "pricing.item.option" => "  {0}: {1}",
            "pricing.item.option_quantity" => "  {0}: {1} x {2}",
            "pricing.item.setup_fee" => "Setup Fee: {0}",
            "pricing.item.cancel_fee" => "Cancellation Fee: {0}",
            "pricing.direction.add" => "adding",
            "pricing.direction.remove" => "removing",
            "pricing.discount.coupon" => "Coupon {0} ({1})",
            "pricing.discount.percent" => "{0}%",
            "pricing.tax.rule" => "{0} ({1}%)",
            _ => return None,
        };
        Some(template)
    }
}

impl Translator for EnglishCatalog {
    fn translate(&self, key: &str, args: &[String]) -> String {
        match Self::template(key) {
            Some(template) => fill_template(template, args),
            None => key.to_string(),
        }
    }
}

/// Formats amounts as `"12.00 USD"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeFormatter;

impl CurrencyFormatter for CodeFormatter {
    fn format(&self, amount: Decimal, currency: &str) -> String {
        let rounded =
            amount.round_dp_with_strategy(CURRENCY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.2} {}", rounded, currency.to_uppercase())
    }
}
