//! Error taxonomy shared by every stage of the SPA test.
//!
//! All failures are deterministic functions of the input matrix and the
//! configuration, so nothing here is retryable. Variants carry the strategy
//! (column) that triggered them where one exists.

use thiserror::Error;

/// Convenience alias used across the workspace's library crates.
pub type SpaResult<T> = std::result::Result<T, SpaError>;

/// Errors raised while validating input or running the test.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpaError {
    /// A configuration parameter is outside its admissible range.
    #[error("invalid configuration `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Human readable description of the violated constraint.
        reason: String,
    },

    /// A series has zero (or undefined) variance where a positive one is required.
    #[error("degenerate series for strategy '{strategy}': {reason}")]
    DegenerateSeries {
        /// Strategy identifier, empty until attached by the caller.
        strategy: String,
        /// What was degenerate.
        reason: String,
    },

    /// Row or column lengths disagree.
    #[error("dimension mismatch for {label}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Strategy name, row label, or other component that disagreed.
        label: String,
        /// Expected length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },

    /// A cell is NaN or infinite.
    #[error("missing or non-finite return for strategy '{strategy}' at period {period}")]
    MissingValue {
        /// Strategy identifier.
        strategy: String,
        /// Zero-based row index.
        period: usize,
    },

    /// Two columns share a strategy identifier.
    #[error("duplicate strategy name '{0}'")]
    DuplicateStrategy(String),

    /// The matrix has no strategies or no periods.
    #[error("return matrix is empty")]
    EmptyMatrix,

    /// The caller raised the cancellation flag between replications.
    #[error("test cancelled before all bootstrap replications completed")]
    Cancelled,
}

impl SpaError {
    /// Builds an `InvalidConfig` error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Builds a `DegenerateSeries` error with no strategy attached yet.
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateSeries {
            strategy: String::new(),
            reason: reason.into(),
        }
    }

    /// Attaches a strategy identifier to a `DegenerateSeries` error.
    ///
    /// Other variants already identify their column and are returned unchanged.
    #[must_use]
    pub fn with_strategy(self, name: &str) -> Self {
        match self {
            Self::DegenerateSeries { strategy, reason } if strategy.is_empty() => {
                Self::DegenerateSeries {
                    strategy: name.to_string(),
                    reason,
                }
            }
            other => other,
        }
    }

    /// Appends the bootstrap replication index to a `DegenerateSeries` reason.
    #[must_use]
    pub fn in_replication(self, replication: usize) -> Self {
        match self {
            Self::DegenerateSeries { strategy, reason } => Self::DegenerateSeries {
                strategy,
                reason: format!("{reason} (bootstrap replication {replication})"),
            },
            other => other,
        }
    }

    /// Returns the strategy identifier carried by the error, if any.
    #[must_use]
    pub fn strategy(&self) -> Option<&str> {
        match self {
            Self::DegenerateSeries { strategy, .. } | Self::MissingValue { strategy, .. }
                if !strategy.is_empty() =>
            {
                Some(strategy)
            }
            Self::DuplicateStrategy(name) => Some(name),
            _ => None,
        }
    }
}
