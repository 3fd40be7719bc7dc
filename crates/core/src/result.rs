//! Outcome of an SPA test run.

use serde::{Deserialize, Serialize};

use crate::config::RecenteringVariant;

/// Per-strategy statistics produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStatistic {
    /// Strategy identifier.
    pub name: String,
    /// Observed annualized Sharpe ratio of excess returns.
    pub sharpe_ratio: f64,
    /// Sharpe ratio minus the null Sharpe ratio.
    pub differential: f64,
    /// Bootstrap standard deviation of the differential.
    pub bootstrap_std_dev: f64,
    /// Studentized statistic `differential / bootstrap_std_dev`.
    pub studentized: f64,
    /// Part of the differential kept (not recentered) in the null distribution.
    pub retained_mean: f64,
    /// Whether the statistic clears the significance threshold.
    pub flagged: bool,
}

/// Result of one SPA test invocation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Maximum studentized statistic over all strategies.
    pub observed_statistic: f64,
    /// Strategy attaining the observed statistic.
    pub best_strategy: String,
    /// Share of bootstrap null maxima at least as large as the observed statistic.
    pub p_value: f64,
    /// (1 - alpha) empirical quantile of the null maxima.
    pub significance_threshold: f64,
    /// Significance level the test was run at.
    pub significance_level: f64,
    /// True when `p_value <= significance_level`.
    pub rejected: bool,
    /// Strategies whose studentized statistic reaches the threshold, in column order.
    pub flagged_strategies: Vec<String>,
    /// Per-strategy detail, in column order.
    pub strategies: Vec<StrategyStatistic>,
    /// Benchmark Sharpe ratio tested against.
    pub null_sharpe: f64,
    /// Number of bootstrap replications.
    pub replications: usize,
    /// Mean block length actually used.
    pub mean_block_length: f64,
    /// Recentering rule used for the null distribution.
    pub recentering: RecenteringVariant,
    /// Number of periods in the return matrix.
    pub periods: usize,
}

impl TestResult {
    /// Looks up the statistics of one strategy.
    #[must_use]
    pub fn strategy(&self, name: &str) -> Option<&StrategyStatistic> {
        self.strategies.iter().find(|s| s.name == name)
    }

    /// Returns true if the strategy was flagged as superior.
    #[must_use]
    pub fn is_flagged(&self, name: &str) -> bool {
        self.flagged_strategies.iter().any(|s| s == name)
    }
}
