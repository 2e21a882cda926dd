//! # Preview Error Type
//!
//! Everything that can go wrong between reading files and printing the
//! breakdown. Pricing itself never fails once the presenter is built.

use thiserror::Error;

use tally_core::PricingError;

/// Result type alias for the preview app.
pub type PreviewResult<T> = Result<T, PreviewError>;

#[derive(Debug, Error)]
pub enum PreviewError {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),

    /// Failed to read a config or scenario file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A config or scenario file is not valid TOML for its shape.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Failed to encode the breakdown.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings rejected by the engine.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The scenario references something it does not define.
    #[error("Invalid scenario: {0}")]
    Scenario(String),
}
