//! Bootstrap approximation of the maximum studentized statistic under the null.
//!
//! For replication `b` and strategy `i` the null statistic is
//!
//! ```text
//! z_i^(b) = (SR_i^(b) - SR_i + mu_i) / sigma_i
//! ```
//!
//! The bootstrap deviation `SR_i^(b) - SR_i` has mean zero, so it carries the
//! strategy back onto the null; `mu_i` is the part of the observed
//! differential the recentering rule lets the strategy keep. Only the
//! per-replication maximum `M_b = max_i z_i^(b)` is retained.

use spa_core::RecenteringVariant;

/// `sqrt(2 ln ln T)`, Hansen's threshold separating poor strategies from
/// boundary ones. Zero when `ln ln T` is not positive (T < 3).
#[must_use]
pub fn loglog_threshold(periods: usize) -> f64 {
    let loglog = (periods as f64).ln().ln();
    if loglog.is_finite() && loglog > 0.0 {
        (2.0 * loglog).sqrt()
    } else {
        0.0
    }
}

/// Part of the observed Sharpe differential kept by the null distribution.
///
/// Never positive: no strategy is handed an advantage under the null. The
/// consistent rule keeps only the shortfall beyond Hansen's log-log margin,
/// `min(0, d + sigma * sqrt(2 ln ln T))`, so it is continuous in `d` and lies
/// between the lower and upper rules.
#[must_use]
pub fn retained_mean(
    variant: RecenteringVariant,
    differential: f64,
    std_dev: f64,
    periods: usize,
) -> f64 {
    match variant {
        RecenteringVariant::Lower => 0.0,
        RecenteringVariant::Consistent => {
            (differential + std_dev * loglog_threshold(periods)).min(0.0)
        }
        RecenteringVariant::Upper => differential.min(0.0),
    }
}

/// Sorted per-replication maxima `{M_1, ..., M_B}`.
#[derive(Debug, Clone, PartialEq)]
pub struct NullDistribution {
    maxima: Vec<f64>,
}

impl NullDistribution {
    /// Wraps (and sorts) a set of per-replication maxima.
    #[must_use]
    pub fn from_maxima(mut maxima: Vec<f64>) -> Self {
        maxima.sort_by(f64::total_cmp);
        Self { maxima }
    }

    /// Builds the distribution from bootstrap Sharpe ratios `replications[b][i]`.
    ///
    /// `observed_sharpe`, `std_devs` and `retained` are indexed by strategy.
    #[must_use]
    pub fn build(
        observed_sharpe: &[f64],
        std_devs: &[f64],
        retained: &[f64],
        replications: &[Vec<f64>],
    ) -> Self {
        let maxima = replications
            .iter()
            .map(|bootstrap| replication_max(observed_sharpe, std_devs, retained, bootstrap))
            .collect();
        Self::from_maxima(maxima)
    }

    /// Number of replications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.maxima.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maxima.is_empty()
    }

    /// Maxima in ascending order.
    #[must_use]
    pub fn maxima(&self) -> &[f64] {
        &self.maxima
    }

    /// Number of maxima at least as large as `statistic`.
    #[must_use]
    pub fn exceedances(&self, statistic: f64) -> usize {
        self.maxima.len() - self.maxima.partition_point(|&m| m < statistic)
    }

    /// Share of maxima at least as large as `statistic`, in `[0, 1]`.
    #[must_use]
    pub fn p_value(&self, statistic: f64) -> f64 {
        if self.maxima.is_empty() {
            return 1.0;
        }
        self.exceedances(statistic) as f64 / self.maxima.len() as f64
    }

    /// Empirical quantile: the order statistic of rank `ceil(probability * B)`,
    /// clamped to `[1, B]`. `None` for an empty distribution.
    #[must_use]
    pub fn quantile(&self, probability: f64) -> Option<f64> {
        let n = self.maxima.len();
        if n == 0 {
            return None;
        }
        let rank = (probability * n as f64).ceil() as usize;
        Some(self.maxima[rank.clamp(1, n) - 1])
    }
}

/// `M_b` for one replication: the largest recentered studentized statistic.
#[must_use]
pub fn replication_max(
    observed_sharpe: &[f64],
    std_devs: &[f64],
    retained: &[f64],
    bootstrap_sharpe: &[f64],
) -> f64 {
    bootstrap_sharpe
        .iter()
        .zip(observed_sharpe)
        .zip(std_devs.iter().zip(retained))
        .map(|((boot, observed), (sd, mu))| (boot - observed + mu) / sd)
        .fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // Recentering rules
    // ============================================================

    #[test]
    fn loglog_threshold_matches_formula() {
        let expected = (2.0 * (100.0_f64).ln().ln()).sqrt();
        assert!((loglog_threshold(100) - expected).abs() < 1e-12);
        assert!(loglog_threshold(2).abs() < f64::EPSILON);
    }

    #[test]
    fn lower_recenters_everything() {
        for d in [-3.0, -0.1, 0.0, 2.0] {
            assert!(retained_mean(RecenteringVariant::Lower, d, 0.5, 100).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn upper_keeps_negative_means_only() {
        assert!((retained_mean(RecenteringVariant::Upper, -0.7, 0.5, 100) + 0.7).abs() < 1e-12);
        assert!(retained_mean(RecenteringVariant::Upper, 1.2, 0.5, 100).abs() < f64::EPSILON);
    }

    #[test]
    fn consistent_keeps_only_the_shortfall_beyond_the_margin() {
        let sd = 0.5;
        let margin = sd * loglog_threshold(250);

        let poor = -margin - 0.3;
        assert!((retained_mean(RecenteringVariant::Consistent, poor, sd, 250) + 0.3).abs() < 1e-12);

        let borderline = -margin + 0.01;
        assert!(
            retained_mean(RecenteringVariant::Consistent, borderline, sd, 250).abs() < f64::EPSILON
        );
        assert!(retained_mean(RecenteringVariant::Consistent, 1.0, sd, 250).abs() < f64::EPSILON);
    }

    #[test]
    fn consistent_is_continuous_at_the_margin() {
        let sd = 0.8;
        let margin = sd * loglog_threshold(150);

        let just_above = retained_mean(RecenteringVariant::Consistent, -margin + 1e-9, sd, 150);
        let just_below = retained_mean(RecenteringVariant::Consistent, -margin - 1e-9, sd, 150);
        assert!((just_above - just_below).abs() < 1e-8);
    }

    #[test]
    fn retained_mean_falls_no_faster_than_the_differential() {
        // Lowering d by delta may lower mu by at most delta, which keeps a
        // single strategy's p-value non-decreasing in the null Sharpe ratio.
        let sd = 0.6;
        let delta = 0.05;
        for variant in RecenteringVariant::ALL {
            let mut d = 2.0;
            while d > -4.0 {
                let drop = retained_mean(variant, d, sd, 150) - retained_mean(variant, d - delta, sd, 150);
                assert!((0.0..=delta + 1e-12).contains(&drop), "{variant} at d = {d}");
                d -= delta;
            }
        }
    }

    #[test]
    fn variants_are_ordered_for_any_differential() {
        for d in [-5.0, -1.5, -0.4, 0.0, 0.3, 4.0] {
            let lower = retained_mean(RecenteringVariant::Lower, d, 0.6, 120);
            let consistent = retained_mean(RecenteringVariant::Consistent, d, 0.6, 120);
            let upper = retained_mean(RecenteringVariant::Upper, d, 0.6, 120);
            assert!(lower >= consistent && consistent >= upper, "d = {d}");
        }
    }

    // ============================================================
    // Distribution
    // ============================================================

    #[test]
    fn replication_max_takes_largest_recentered_statistic() {
        let observed = [1.0, 0.0];
        let sds = [0.5, 1.0];
        let retained = [0.0, -0.5];
        // (1.2 - 1.0) / 0.5 = 0.4 ; (1.0 - 0.0 - 0.5) / 1.0 = 0.5
        let m = replication_max(&observed, &sds, &retained, &[1.2, 1.0]);
        assert!((m - 0.5).abs() < 1e-12);
    }

    #[test]
    fn build_sorts_maxima() {
        let observed = [0.0];
        let sds = [1.0];
        let retained = [0.0];
        let replications = vec![vec![0.3], vec![-1.0], vec![2.0]];

        let dist = NullDistribution::build(&observed, &sds, &retained, &replications);
        assert_eq!(dist.maxima(), &[-1.0, 0.3, 2.0]);
        assert_eq!(dist.len(), 3);
    }

    #[test]
    fn p_value_counts_ties_as_exceedances() {
        let dist = NullDistribution::from_maxima(vec![0.5, 1.0, 1.0, 2.0]);

        assert_eq!(dist.exceedances(1.0), 3);
        assert!((dist.p_value(1.0) - 0.75).abs() < f64::EPSILON);
        assert!((dist.p_value(5.0)).abs() < f64::EPSILON);
        assert!((dist.p_value(-5.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn quantile_uses_ceiling_rank() {
        let dist = NullDistribution::from_maxima((1..=20).map(f64::from).collect());

        // ceil(0.95 * 20) = 19
        assert!((dist.quantile(0.95).unwrap() - 19.0).abs() < f64::EPSILON);
        assert!((dist.quantile(0.0).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((dist.quantile(1.0).unwrap() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn single_replication_gives_binary_p_value() {
        let dist = NullDistribution::from_maxima(vec![0.8]);

        assert!((dist.p_value(0.5) - 1.0).abs() < f64::EPSILON);
        assert!(dist.p_value(0.9).abs() < f64::EPSILON);
        assert!((dist.quantile(0.95).unwrap() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_distribution_is_conservative() {
        let dist = NullDistribution::from_maxima(vec![]);
        assert!(dist.is_empty());
        assert!((dist.p_value(0.0) - 1.0).abs() < f64::EPSILON);
        assert!(dist.quantile(0.5).is_none());
    }
}
