//! Studentization of Sharpe differentials.
//!
//! The bootstrap standard deviation of a strategy's Sharpe differential is
//! taken around the observed differential (Hansen 2005):
//!
//! ```text
//! sigma_i^2 = (1/B) * sum_b (d_i^(b) - d_i)^2
//! ```
//!
//! Because `d_i^(b) - d_i = SR_i^(b) - SR_i`, the null Sharpe ratio cancels
//! and sigma does not depend on the benchmark.

use spa_core::{SpaError, SpaResult};

/// Studentized statistics of every strategy, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentizedStatistics {
    /// `SR_i - null_sharpe`.
    pub differentials: Vec<f64>,
    /// Bootstrap standard deviation of each differential.
    pub std_devs: Vec<f64>,
    /// `differential / std_dev`.
    pub statistics: Vec<f64>,
}

impl StudentizedStatistics {
    /// Largest statistic and the column attaining it (first on ties).
    #[must_use]
    pub fn max(&self) -> Option<(usize, f64)> {
        self.statistics
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, t)| match best {
                Some((_, current)) if current >= t => best,
                _ => Some((i, t)),
            })
    }
}

/// Converts observed Sharpe ratios and their bootstrap replications into studentized statistics.
pub struct Studentizer<'a> {
    strategies: &'a [String],
    observed_sharpe: &'a [f64],
    null_sharpe: f64,
}

impl<'a> Studentizer<'a> {
    #[must_use]
    pub fn new(strategies: &'a [String], observed_sharpe: &'a [f64], null_sharpe: f64) -> Self {
        Self {
            strategies,
            observed_sharpe,
            null_sharpe,
        }
    }

    /// Studentizes every strategy against `replications[b][i]`, the Sharpe
    /// ratio of strategy `i` in bootstrap replication `b`.
    ///
    /// # Errors
    ///
    /// - [`SpaError::DimensionMismatch`] when a replication has the wrong width
    /// - [`SpaError::DegenerateSeries`] naming the strategy whose bootstrap
    ///   standard deviation is zero
    pub fn studentize(&self, replications: &[Vec<f64>]) -> SpaResult<StudentizedStatistics> {
        let n = self.observed_sharpe.len();
        if let Some((b, row)) = replications.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(SpaError::DimensionMismatch {
                label: format!("bootstrap replication {b}"),
                expected: n,
                actual: row.len(),
            });
        }

        let mut differentials = Vec::with_capacity(n);
        let mut std_devs = Vec::with_capacity(n);
        let mut statistics = Vec::with_capacity(n);

        for (i, (&sharpe, name)) in self.observed_sharpe.iter().zip(self.strategies).enumerate() {
            let differential = sharpe - self.null_sharpe;
            let std_dev = bootstrap_std_dev(sharpe, replications.iter().map(|r| r[i]))
                .ok_or_else(|| SpaError::invalid_config("bootstrap_replications", "no replications"))?;
            let statistic = studentize(differential, std_dev).map_err(|e| e.with_strategy(name))?;

            differentials.push(differential);
            std_devs.push(std_dev);
            statistics.push(statistic);
        }

        Ok(StudentizedStatistics {
            differentials,
            std_devs,
            statistics,
        })
    }
}

/// Root mean squared deviation of bootstrap values around the observed value.
///
/// Returns `None` when there are no bootstrap values.
pub fn bootstrap_std_dev(observed: f64, replicated: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (count, sum_sq) = replicated
        .into_iter()
        .fold((0_usize, 0.0_f64), |(count, sum), value| {
            (count + 1, sum + (value - observed).powi(2))
        });
    if count == 0 {
        return None;
    }
    Some((sum_sq / count as f64).sqrt())
}

/// Divides a differential by its bootstrap standard deviation.
///
/// # Errors
///
/// Returns [`SpaError::DegenerateSeries`] (no strategy attached) when the
/// standard deviation is zero or not finite: every replication reproduced the
/// observed Sharpe ratio, so the statistic is undefined.
pub fn studentize(differential: f64, std_dev: f64) -> SpaResult<f64> {
    if !(std_dev.is_finite() && std_dev > 0.0) {
        return Err(SpaError::degenerate(format!(
            "bootstrap standard deviation of the Sharpe differential is {std_dev}"
        )));
    }
    Ok(differential / std_dev)
}
