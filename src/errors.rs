//! Error taxonomy shared by the reconstruction and status engines.
//!
//! Engines never panic on valid finite input; every failure they can report
//! is one of these variants. The serving layer wraps them in `anyhow` or maps
//! them to HTTP status codes.

use thiserror::Error;

// ---

/// Errors reported by the nutrient engines and their boundary checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Fewer than two lab anchors exist for a monitoring context.
    ///
    /// Reported alongside an empty reconstruction, never returned as `Err`
    /// from [`crate::reconstruction::reconstruct`].
    #[error("insufficient anchors: found {found}, need at least 2")]
    InsufficientAnchors { found: usize },

    /// A sensor or lab value is NaN, infinite, or negative.
    #[error("out-of-range input for {field}: {value}")]
    OutOfRangeInput { field: String, value: f64 },

    /// Threshold configuration is malformed (e.g. `phLow >= phHigh`).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Daily records are not strictly ascending by timestamp.
    #[error("daily records out of order at index {index}")]
    UnorderedRecords { index: usize },
}

impl EngineError {
    // ---
    pub fn out_of_range(field: impl Into<String>, value: f64) -> Self {
        EngineError::OutOfRangeInput {
            field: field.into(),
            value,
        }
    }
}
