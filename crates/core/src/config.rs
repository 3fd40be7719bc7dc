use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SpaError, SpaResult};

/// How strategy means are treated when the bootstrap null distribution is built.
///
/// Ordered from most to least conservative: for the same data and seed the
/// p-values satisfy `lower >= consistent >= upper`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecenteringVariant {
    /// Every strategy is recentered onto the null value.
    Lower,
    /// Strategies keep only the shortfall of their mean beyond a log-log margin.
    #[default]
    Consistent,
    /// Every strategy keeps its own mean, capped at the null value.
    Upper,
}

impl RecenteringVariant {
    /// All variants, most conservative first.
    pub const ALL: [Self; 3] = [Self::Lower, Self::Consistent, Self::Upper];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Consistent => "consistent",
            Self::Upper => "upper",
        }
    }
}

impl fmt::Display for RecenteringVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecenteringVariant {
    type Err = SpaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        let wanted = wanted.as_str();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted || &v.as_str()[..1] == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                SpaError::invalid_config(
                    "recentering",
                    format!("unknown variant '{s}', expected one of {}", names.join(", ")),
                )
            })
    }
}

/// Parameters of one SPA test run.
///
/// The engine never fills in defaults: it validates exactly what it is given.
/// [`Default`] exists for the configuration loader and CLI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaConfig {
    /// Benchmark Sharpe ratio (annualized) that strategies must beat.
    pub null_sharpe: f64,
    /// Number of bootstrap replications (B).
    pub bootstrap_replications: usize,
    /// Mean block length (L) of the stationary bootstrap, in periods.
    /// `None` selects the automatic rule `max(1, round(T^(1/3)))`.
    pub block_length: Option<f64>,
    /// Null recentering rule.
    pub recentering: RecenteringVariant,
    /// Significance level (alpha), strictly between 0 and 1.
    pub significance_level: f64,
    /// Periods per year (k) used for annualization.
    pub annualization_factor: f64,
    /// Seed of the bootstrap random source.
    pub random_seed: u64,
    /// Per-period risk-free rate subtracted from every return.
    pub risk_free_rate: f64,
}

impl Default for SpaConfig {
    fn default() -> Self {
        Self {
            null_sharpe: 0.0,
            bootstrap_replications: 1_000,
            block_length: None,
            recentering: RecenteringVariant::Consistent,
            significance_level: 0.05,
            annualization_factor: 252.0,
            random_seed: 42,
            risk_free_rate: 0.0,
        }
    }
}

impl SpaConfig {
    /// Creates a configuration with the given replication count and significance level.
    #[must_use]
    pub fn new(bootstrap_replications: usize, significance_level: f64) -> Self {
        Self {
            bootstrap_replications,
            significance_level,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_null_sharpe(mut self, null_sharpe: f64) -> Self {
        self.null_sharpe = null_sharpe;
        self
    }

    #[must_use]
    pub fn with_block_length(mut self, block_length: f64) -> Self {
        self.block_length = Some(block_length);
        self
    }

    #[must_use]
    pub fn with_recentering(mut self, recentering: RecenteringVariant) -> Self {
        self.recentering = recentering;
        self
    }

    #[must_use]
    pub fn with_annualization_factor(mut self, annualization_factor: f64) -> Self {
        self.annualization_factor = annualization_factor;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    #[must_use]
    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    /// Mean block length for a series of `periods` rows.
    #[must_use]
    pub fn resolve_block_length(&self, periods: usize) -> f64 {
        match self.block_length {
            Some(length) => length,
            None => (periods as f64).cbrt().round().max(1.0),
        }
    }

    /// Checks every parameter, and the series length against the block length.
    ///
    /// # Errors
    ///
    /// Returns [`SpaError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self, periods: usize) -> SpaResult<()> {
        if self.bootstrap_replications == 0 {
            return Err(SpaError::invalid_config(
                "bootstrap_replications",
                "must be a positive integer",
            ));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(SpaError::invalid_config(
                "significance_level",
                format!("must lie in (0, 1), got {}", self.significance_level),
            ));
        }
        if !(self.annualization_factor.is_finite() && self.annualization_factor > 0.0) {
            return Err(SpaError::invalid_config(
                "annualization_factor",
                format!("must be positive, got {}", self.annualization_factor),
            ));
        }
        if !self.null_sharpe.is_finite() {
            return Err(SpaError::invalid_config("null_sharpe", "must be finite"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(SpaError::invalid_config("risk_free_rate", "must be finite"));
        }
        if let Some(length) = self.block_length {
            if !(length.is_finite() && length > 0.0) {
                return Err(SpaError::invalid_config(
                    "block_length",
                    format!("must be positive, got {length}"),
                ));
            }
        }

        let block_length = self.resolve_block_length(periods);
        if (periods as f64) <= block_length {
            return Err(SpaError::invalid_config(
                "block_length",
                format!(
                    "series of {periods} periods is not longer than the mean block length {block_length}"
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_expected_values() {
        let config = SpaConfig::default();

        assert_eq!(config.bootstrap_replications, 1_000);
        assert_eq!(config.recentering, RecenteringVariant::Consistent);
        assert!((config.significance_level - 0.05).abs() < f64::EPSILON);
        assert!((config.annualization_factor - 252.0).abs() < f64::EPSILON);
        assert!(config.block_length.is_none());
    }

    #[test]
    fn builders_set_fields() {
        let config = SpaConfig::new(500, 0.1)
            .with_null_sharpe(0.5)
            .with_block_length(8.0)
            .with_recentering(RecenteringVariant::Upper)
            .with_annualization_factor(12.0)
            .with_seed(7)
            .with_risk_free_rate(0.0001);

        assert_eq!(config.bootstrap_replications, 500);
        assert_eq!(config.block_length, Some(8.0));
        assert_eq!(config.recentering, RecenteringVariant::Upper);
        assert_eq!(config.random_seed, 7);
        assert!((config.null_sharpe - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn auto_block_length_is_cube_root() {
        let config = SpaConfig::default();

        assert!((config.resolve_block_length(1000) - 10.0).abs() < f64::EPSILON);
        assert!((config.resolve_block_length(100) - 5.0).abs() < f64::EPSILON);
        assert!((config.resolve_block_length(2) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(SpaConfig::default().validate(100).is_ok());
    }

    #[test]
    fn validate_rejects_zero_replications() {
        let err = SpaConfig::new(0, 0.05).validate(100).unwrap_err();
        assert!(matches!(
            err,
            SpaError::InvalidConfig {
                field: "bootstrap_replications",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_alpha_outside_unit_interval() {
        for alpha in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let err = SpaConfig::new(100, alpha).validate(100).unwrap_err();
            assert!(matches!(
                err,
                SpaError::InvalidConfig {
                    field: "significance_level",
                    ..
                }
            ));
        }
    }

    #[test]
    fn validate_rejects_bad_block_length() {
        for length in [0.0, -2.0, f64::INFINITY] {
            let err = SpaConfig::default()
                .with_block_length(length)
                .validate(100)
                .unwrap_err();
            assert!(matches!(
                err,
                SpaError::InvalidConfig {
                    field: "block_length",
                    ..
                }
            ));
        }
    }

    #[test]
    fn validate_rejects_series_shorter_than_block() {
        let err = SpaConfig::default()
            .with_block_length(50.0)
            .validate(20)
            .unwrap_err();
        assert!(matches!(
            err,
            SpaError::InvalidConfig {
                field: "block_length",
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_non_positive_annualization() {
        let err = SpaConfig::default()
            .with_annualization_factor(0.0)
            .validate(100)
            .unwrap_err();
        assert!(matches!(
            err,
            SpaError::InvalidConfig {
                field: "annualization_factor",
                ..
            }
        ));
    }

    #[test]
    fn recentering_parses_names() {
        assert_eq!(
            "LOWER".parse::<RecenteringVariant>().unwrap(),
            RecenteringVariant::Lower
        );
        assert_eq!(
            "u".parse::<RecenteringVariant>().unwrap(),
            RecenteringVariant::Upper
        );
        let err = "median".parse::<RecenteringVariant>().unwrap_err();
        assert!(err.to_string().contains("lower, consistent, upper"));
    }

    #[test]
    fn recentering_serializes_lowercase() {
        let json = serde_json::to_string(&RecenteringVariant::Consistent).unwrap();
        assert_eq!(json, "\"consistent\"");
    }
}
