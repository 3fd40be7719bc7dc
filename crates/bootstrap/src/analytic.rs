//! Closed-form step-down screen for the strategy with maximum Sharpe ratio.
//!
//! A bootstrap-free cross-check of the SPA test. Strategies are ranked by
//! per-period Sharpe ratio and the set is peeled from the top: at each step
//! the Sharpe ratios of the remaining subset are decorrelated with the
//! equicorrelation transform of Pav (2019, eq. 15),
//!
//! ```text
//! c  = 1 / sqrt(1 + (m - 1) * rho)
//! xi = c * mean(SR) + (SR - mean(SR)) / sqrt(1 - rho)
//! ```
//!
//! strategies whose `xi` clears the log-log corrected threshold
//! `c * SR0 - sqrt(2 ln ln T / T)` are counted (`k`), and the leader is
//! declared significant when `max(xi) - c * SR0 >= z(1 - alpha / k)`.
//! The screen stops at the first leader that fails.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use spa_core::{correlation, ReturnMatrix, SpaError, SpaResult};

/// Smallest `1 - rho` treated as distinct from perfect correlation.
const CORRELATION_TOLERANCE: f64 = 1e-10;

/// Diagnostics of one step of the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenStep {
    /// Highest-Sharpe strategy of the subset examined at this step.
    pub leader: String,
    /// Number of strategies in the subset.
    pub subset_size: usize,
    /// Mean correlation between the leader and the rest of the ranking.
    pub mean_correlation: f64,
    /// Largest transformed Sharpe ratio in the subset.
    pub max_xi: f64,
    /// Log-log corrected admission threshold.
    pub threshold: f64,
    /// Strategies clearing the threshold (k).
    pub admitted: usize,
    /// Normal critical value `z(1 - alpha / k)`; `None` when nothing was admitted.
    pub critical_value: Option<f64>,
    /// Whether the leader was declared significant.
    pub significant: bool,
}

/// Outcome of the step-down screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenResult {
    /// Significant strategies, best first.
    pub significant: Vec<String>,
    /// One entry per step taken.
    pub steps: Vec<ScreenStep>,
}

/// Step-down screen configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticScreen {
    /// Per-period null Sharpe ratio.
    pub null_sharpe: f64,
    /// Significance level, strictly between 0 and 1.
    pub significance_level: f64,
    /// Per-period risk-free rate subtracted from returns.
    pub risk_free_rate: f64,
}

impl AnalyticScreen {
    #[must_use]
    pub fn new(null_sharpe: f64, significance_level: f64) -> Self {
        Self {
            null_sharpe,
            significance_level,
            risk_free_rate: 0.0,
        }
    }

    #[must_use]
    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    /// Runs the screen.
    ///
    /// # Errors
    ///
    /// - [`SpaError::InvalidConfig`] for alpha outside (0, 1), fewer than 3
    ///   strategies, fewer than 3 periods, or a mean correlation outside the
    ///   range the transform admits
    /// - [`SpaError::DegenerateSeries`] for a zero-variance strategy
    pub fn run(&self, matrix: &ReturnMatrix) -> SpaResult<ScreenResult> {
        let alpha = self.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(SpaError::invalid_config(
                "significance_level",
                format!("must lie in (0, 1), got {alpha}"),
            ));
        }
        let n = matrix.n_strategies();
        if n < 3 {
            return Err(SpaError::invalid_config(
                "strategies",
                format!("step-down screen needs at least 3 strategies, got {n}"),
            ));
        }
        let periods = matrix.periods();
        if periods < 3 {
            return Err(SpaError::invalid_config(
                "periods",
                format!("log-log correction needs at least 3 periods, got {periods}"),
            ));
        }

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| SpaError::invalid_config("significance_level", e.to_string()))?;

        let excess = matrix.excess_returns(self.risk_free_rate);
        let sharpe = excess.sharpe_ratios(1.0)?;

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| sharpe[b].total_cmp(&sharpe[a]));

        let t = periods as f64;
        let loglog_penalty = (2.0 * t.ln().ln() / t).sqrt();

        let mut significant = Vec::new();
        let mut steps = Vec::new();

        for i in 0..n - 2 {
            let subset = &order[i..];
            let m = subset.len();
            let leader = excess.strategies()[subset[0]].clone();

            let rho = mean_correlation(&excess, subset)?;
            let spread = 1.0 + (m as f64 - 1.0) * rho;
            if !(spread > 0.0 && 1.0 - rho > CORRELATION_TOLERANCE) {
                return Err(SpaError::invalid_config(
                    "correlation",
                    format!(
                        "mean correlation {rho} of '{leader}' is outside the admissible range for {m} strategies"
                    ),
                ));
            }

            let c = 1.0 / spread.sqrt();
            let zeta_bar = subset.iter().map(|&j| sharpe[j]).sum::<f64>() / m as f64;
            let xi: Vec<f64> = subset
                .iter()
                .map(|&j| c * zeta_bar + (sharpe[j] - zeta_bar) / (1.0 - rho).sqrt())
                .collect();

            let threshold = c * self.null_sharpe - loglog_penalty;
            let admitted = xi.iter().filter(|&&x| x > threshold).count();
            let max_xi = xi.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let critical_value =
                (admitted > 0).then(|| normal.inverse_cdf(1.0 - alpha / admitted as f64));
            let is_significant =
                critical_value.is_some_and(|z| max_xi - c * self.null_sharpe >= z);

            debug!(
                step = i,
                leader = %leader,
                rho,
                max_xi,
                admitted,
                significant = is_significant,
                "Step-down screen"
            );

            steps.push(ScreenStep {
                leader: leader.clone(),
                subset_size: m,
                mean_correlation: rho,
                max_xi,
                threshold,
                admitted,
                critical_value,
                significant: is_significant,
            });

            if !is_significant {
                break;
            }
            significant.push(leader);
        }

        Ok(ScreenResult { significant, steps })
    }
}

/// Mean correlation between the subset's leader and every other member.
fn mean_correlation(matrix: &ReturnMatrix, subset: &[usize]) -> SpaResult<f64> {
    let leader = subset[0];
    let mut total = 0.0;

    for &other in &subset[1..] {
        total += correlation(matrix.column(leader), matrix.column(other)).ok_or_else(|| {
            SpaError::degenerate("correlation undefined for zero-variance series")
                .with_strategy(&matrix.strategies()[leader])
        })?;
    }

    Ok(total / (subset.len() - 1) as f64)
}
