//! SPA test engine: observed statistics, bootstrap replications, null distribution, verdicts.
//!
//! # Example
//!
//! ```ignore
//! use spa_bootstrap::SpaTest;
//! use spa_core::SpaConfig;
//!
//! let config = SpaConfig::new(1000, 0.05).with_block_length(5.0).with_seed(7);
//! let result = SpaTest::new(config).run(&matrix)?;
//! println!("p = {:.4}, flagged = {:?}", result.p_value, result.flagged_strategies);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, warn};

use spa_core::{
    sharpe_ratio, ReturnMatrix, SpaConfig, SpaError, SpaResult, StrategyStatistic, TestResult,
};

use crate::null_distribution::{retained_mean, NullDistribution};
use crate::resampler::{gather_into, StationaryBootstrap};
use crate::studentizer::Studentizer;

/// Replication counts below this produce a coarse p-value grid.
const LOW_REPLICATION_WARNING: usize = 100;

/// Hansen's Superior Predictive Ability test over the Sharpe ratios of a strategy set.
#[derive(Debug, Clone)]
pub struct SpaTest {
    config: SpaConfig,
}

impl SpaTest {
    #[must_use]
    pub fn new(config: SpaConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SpaConfig {
        &self.config
    }

    /// Runs the test to completion.
    ///
    /// # Errors
    ///
    /// - [`SpaError::InvalidConfig`] for out-of-range parameters or a series
    ///   not longer than the mean block length
    /// - [`SpaError::DegenerateSeries`] naming the strategy whose observed
    ///   variance is zero, or whose resampled column has zero variance in some
    ///   replication. The latter can happen on a non-degenerate series when
    ///   every drawn block lands on a constant stretch; the error then names
    ///   the replication as well.
    pub fn run(&self, matrix: &ReturnMatrix) -> SpaResult<TestResult> {
        self.run_with_cancel(matrix, &AtomicBool::new(false))
    }

    /// Runs the test, checking `cancel` before each bootstrap replication.
    ///
    /// # Errors
    ///
    /// Same as [`SpaTest::run`], plus [`SpaError::Cancelled`] once `cancel` is raised.
    pub fn run_with_cancel(
        &self,
        matrix: &ReturnMatrix,
        cancel: &AtomicBool,
    ) -> SpaResult<TestResult> {
        let config = &self.config;
        let periods = matrix.periods();
        config.validate(periods)?;

        let block_length = config.resolve_block_length(periods);
        let replications = config.bootstrap_replications;
        if replications < LOW_REPLICATION_WARNING {
            warn!(
                replications,
                "Few bootstrap replications; p-value resolution is 1/{}", replications
            );
        }

        info!(
            periods,
            strategies = matrix.n_strategies(),
            replications,
            block_length,
            recentering = %config.recentering,
            null_sharpe = config.null_sharpe,
            "Running SPA test"
        );

        // Observed statistics
        let excess = matrix.excess_returns(config.risk_free_rate);
        let observed_sharpe = excess.sharpe_ratios(config.annualization_factor)?;
        debug!(?observed_sharpe, "Observed Sharpe ratios");

        // Bootstrap
        let resampler = StationaryBootstrap::new(periods, block_length, config.random_seed)?;
        let bootstrap_sharpe = self.bootstrap_sharpe(&excess, &resampler, cancel)?;
        debug!(replications = bootstrap_sharpe.len(), "Bootstrap replications complete");

        // Studentize and build the null distribution
        let studentized = Studentizer::new(excess.strategies(), &observed_sharpe, config.null_sharpe)
            .studentize(&bootstrap_sharpe)?;
        let retained: Vec<f64> = studentized
            .differentials
            .iter()
            .zip(&studentized.std_devs)
            .map(|(&d, &sd)| retained_mean(config.recentering, d, sd, periods))
            .collect();
        let null = NullDistribution::build(
            &observed_sharpe,
            &studentized.std_devs,
            &retained,
            &bootstrap_sharpe,
        );

        let (best_index, observed_statistic) = studentized
            .max()
            .ok_or(SpaError::EmptyMatrix)?;
        let p_value = null.p_value(observed_statistic);
        let significance_threshold = null
            .quantile(1.0 - config.significance_level)
            .ok_or(SpaError::EmptyMatrix)?;
        let rejected = p_value <= config.significance_level;
        debug!(
            observed_statistic,
            significance_threshold,
            exceedances = null.exceedances(observed_statistic),
            "Null distribution built"
        );

        let strategies: Vec<StrategyStatistic> = excess
            .strategies()
            .iter()
            .enumerate()
            .map(|(i, name)| StrategyStatistic {
                name: name.clone(),
                sharpe_ratio: observed_sharpe[i],
                differential: studentized.differentials[i],
                bootstrap_std_dev: studentized.std_devs[i],
                studentized: studentized.statistics[i],
                retained_mean: retained[i],
                flagged: studentized.statistics[i] >= significance_threshold,
            })
            .collect();
        let flagged_strategies: Vec<String> = strategies
            .iter()
            .filter(|s| s.flagged)
            .map(|s| s.name.clone())
            .collect();

        info!(
            p_value,
            rejected,
            flagged = flagged_strategies.len(),
            "SPA test complete"
        );

        Ok(TestResult {
            observed_statistic,
            best_strategy: excess.strategies()[best_index].clone(),
            p_value,
            significance_threshold,
            significance_level: config.significance_level,
            rejected,
            flagged_strategies,
            strategies,
            null_sharpe: config.null_sharpe,
            replications,
            mean_block_length: resampler.mean_block_length(),
            recentering: config.recentering,
            periods,
        })
    }

    /// Annualized Sharpe ratio of every strategy in every replication, indexed `[b][i]`.
    ///
    /// Replication `b` reads only the shared matrix and its own random stream,
    /// and results are collected in replication order, so the output is the
    /// same whether or not the replications run in parallel.
    fn bootstrap_sharpe(
        &self,
        matrix: &ReturnMatrix,
        resampler: &StationaryBootstrap,
        cancel: &AtomicBool,
    ) -> SpaResult<Vec<Vec<f64>>> {
        let annualization_factor = self.config.annualization_factor;

        let replicate = |b: usize| -> SpaResult<Vec<f64>> {
            if cancel.load(Ordering::Relaxed) {
                return Err(SpaError::Cancelled);
            }

            let indices = resampler.replication_indices(b);
            let mut resampled = Vec::with_capacity(indices.len());
            matrix
                .iter_columns()
                .map(|(name, column)| {
                    gather_into(column, &indices, &mut resampled);
                    sharpe_ratio(&resampled, annualization_factor)
                        .map_err(|e| e.with_strategy(name).in_replication(b))
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let sharpe = (0..self.config.bootstrap_replications)
            .into_par_iter()
            .map(replicate)
            .collect::<SpaResult<Vec<_>>>();

        #[cfg(not(feature = "parallel"))]
        let sharpe = (0..self.config.bootstrap_replications)
            .map(replicate)
            .collect::<SpaResult<Vec<_>>>();

        sharpe
    }
}
