//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── PricingError     - Configuration / parsing failures               │
//! │  └── ValidationError  - Field-level validation failures                │
//! │                                                                         │
//! │  tally-preview errors (app)                                            │
//! │  └── PreviewError     - File, TOML and JSON failures                   │
//! │                                                                         │
//! │  Flow: ValidationError → PricingError → PreviewError → stderr          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error Here
//! Formatting a breakdown never fails. Unknown coupon ids, unknown tax rule
//! ids and unusable proration inputs are skipped, not reported. Currency
//! mismatches inside one line item set and negative quantities are caller
//! bugs and trip assertions instead.

use thiserror::Error;

// =============================================================================
// Pricing Error
// =============================================================================

/// Errors raised at the configuration boundary of the engine.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Settings failed validation.
    #[error("Invalid pricing settings: {0}")]
    InvalidSettings(String),

    /// A billing period name could not be parsed.
    ///
    /// ## When This Occurs
    /// - Settings list an unknown proratable period
    /// - A scenario file spells a period as "monthly" instead of "month"
    #[error("Unknown billing period: '{0}'. Valid options: day, week, month, year, onetime")]
    UnknownPeriod(String),

    /// A discount type name could not be parsed.
    #[error("Unknown discount type: '{0}'. Valid options: percent, fixed")]
    UnknownDiscountType(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., bad currency code, bad date format).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;
