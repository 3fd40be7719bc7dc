//! Sharpe ratio and the small set of descriptive statistics it needs.
//!
//! All functions are pure and operate on a single return series. The
//! standard deviation is always the sample (n - 1) estimator.

use crate::error::{SpaError, SpaResult};

/// Arithmetic mean of a series. Returns `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (Bessel corrected). Returns `None` below two observations.
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    // A constant series can still produce a tiny positive spread through
    // rounding in the mean, so it is detected directly.
    let first = values[0];
    if values.iter().all(|&v| v == first) {
        return Some(0.0);
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Annualized Sharpe ratio of a return series.
///
/// # Formula
/// ```text
/// SR = mean(r) * k / (stdev(r) * sqrt(k))
/// ```
/// where `stdev` is the sample standard deviation and `k` the number of
/// periods per year. With `k = 1` this is the per-period Sharpe ratio.
///
/// # Errors
/// Returns [`SpaError::DegenerateSeries`] (without a strategy attached) when
/// the series has fewer than two observations or zero variance, and
/// [`SpaError::InvalidConfig`] when `k` is not a positive finite number.
///
/// # Examples
/// ```
/// use spa_core::sharpe::sharpe_ratio;
///
/// let sr = sharpe_ratio(&[0.01, 0.03, 0.02, 0.04], 1.0).unwrap();
/// assert!((sr - 0.025 / 0.012_909_944).abs() < 1e-6);
///
/// assert!(sharpe_ratio(&[0.01, 0.01, 0.01], 252.0).is_err());
/// ```
pub fn sharpe_ratio(returns: &[f64], annualization_factor: f64) -> SpaResult<f64> {
    if !(annualization_factor.is_finite() && annualization_factor > 0.0) {
        return Err(SpaError::invalid_config(
            "annualization_factor",
            format!("must be a positive number, got {annualization_factor}"),
        ));
    }

    let (Some(mean), Some(std_dev)) = (mean(returns), sample_std_dev(returns)) else {
        return Err(SpaError::degenerate(format!(
            "Sharpe ratio needs at least 2 observations, got {}",
            returns.len()
        )));
    };

    if !(std_dev.is_finite() && std_dev > 0.0) {
        return Err(SpaError::degenerate(format!(
            "return standard deviation is {std_dev}"
        )));
    }

    let annual_mean = mean * annualization_factor;
    let annual_vol = std_dev * annualization_factor.sqrt();
    Ok(annual_mean / annual_vol)
}

/// Pearson correlation of two equally long series.
///
/// Returns `None` when lengths differ, fewer than two observations are given,
/// or either series has zero variance.
#[must_use]
pub fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}
