//! Stationary bootstrap resampling for multivariate return series.
//!
//! Implements the Politis–Romano stationary bootstrap: a resampled path is
//! assembled from blocks of consecutive rows with a uniformly random start and
//! a geometrically distributed length, wrapping past the last row back to row
//! 0. Every strategy is resampled with the same row indices so cross-sectional
//! dependence survives alongside the serial dependence.
//!
//! # Example
//!
//! ```ignore
//! use spa_bootstrap::resampler::StationaryBootstrap;
//!
//! let resampler = StationaryBootstrap::new(matrix.periods(), 5.0, 42)?;
//! let indices = resampler.replication_indices(0);
//! let mut resampled = Vec::new();
//! gather_into(matrix.column(0), &indices, &mut resampled);
//! assert_eq!(resampled.len(), matrix.periods());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Geometric};

use spa_core::{SpaError, SpaResult};

/// A run of consecutive rows copied into a resampled path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// First source row of the block.
    pub start: usize,
    /// Number of rows copied (after truncation to the remaining length).
    pub len: usize,
}

/// Stationary bootstrap resampler over a fixed series length.
#[derive(Debug, Clone)]
pub struct StationaryBootstrap {
    periods: usize,
    mean_block_length: f64,
    block_length: Geometric,
    seed: u64,
}

impl StationaryBootstrap {
    /// Creates a resampler for series of `periods` rows.
    ///
    /// Block lengths are `1 + Geometric(1 / L)` so their mean is `L`, then
    /// clamped to `[1, periods]`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaError::InvalidConfig`] when `periods` is zero or the mean
    /// block length is not a positive finite number.
    pub fn new(periods: usize, mean_block_length: f64, seed: u64) -> SpaResult<Self> {
        if periods == 0 {
            return Err(SpaError::invalid_config(
                "periods",
                "cannot resample an empty series",
            ));
        }
        if !(mean_block_length.is_finite() && mean_block_length > 0.0) {
            return Err(SpaError::invalid_config(
                "block_length",
                format!("must be positive, got {mean_block_length}"),
            ));
        }

        let restart_probability = (1.0 / mean_block_length).min(1.0);
        let block_length = Geometric::new(restart_probability)
            .map_err(|e| SpaError::invalid_config("block_length", e.to_string()))?;

        Ok(Self {
            periods,
            mean_block_length,
            block_length,
            seed,
        })
    }

    /// Series length every replication is filled to.
    #[must_use]
    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Mean block length parameter.
    #[must_use]
    pub fn mean_block_length(&self) -> f64 {
        self.mean_block_length
    }

    /// Independent random source for one replication.
    ///
    /// All replications share the seed and differ in the ChaCha stream number,
    /// so the draws of replication `b` do not depend on which worker runs it
    /// or on how many other replications ran before.
    #[must_use]
    pub fn replication_rng(&self, replication: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(replication as u64);
        rng
    }

    fn draw_block_length(&self, rng: &mut ChaCha8Rng) -> usize {
        let extra = self.block_length.sample(rng);
        usize::try_from(extra)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
            .clamp(1, self.periods)
    }

    /// Draws the blocks of one resampled path. Lengths sum to exactly `periods`.
    pub fn draw_blocks(&self, rng: &mut ChaCha8Rng) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut filled = 0;

        while filled < self.periods {
            let start = rng.gen_range(0..self.periods);
            let len = self.draw_block_length(rng).min(self.periods - filled);
            blocks.push(Block { start, len });
            filled += len;
        }

        blocks
    }

    /// Source row indices of one resampled path, wrapping past the last row.
    pub fn resample_indices(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut indices = Vec::with_capacity(self.periods);
        for block in self.draw_blocks(rng) {
            indices.extend((0..block.len).map(|offset| (block.start + offset) % self.periods));
        }
        indices
    }

    /// Source row indices of replication `replication`.
    #[must_use]
    pub fn replication_indices(&self, replication: usize) -> Vec<usize> {
        let mut rng = self.replication_rng(replication);
        self.resample_indices(&mut rng)
    }
}

/// Replaces the contents of `out` with `column` read at `indices`.
pub fn gather_into(column: &[f64], indices: &[usize], out: &mut Vec<f64>) {
    out.clear();
    out.extend(indices.iter().map(|&row| column[row]));
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================
    // Construction
    // ============================================================

    #[test]
    fn new_rejects_non_positive_block_length() {
        for length in [0.0, -1.0, f64::NAN] {
            let err = StationaryBootstrap::new(100, length, 1).unwrap_err();
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
    fn new_rejects_empty_series() {
        assert!(StationaryBootstrap::new(0, 5.0, 1).is_err());
    }

    // ============================================================
    // Block drawing
    // ============================================================

    #[test]
    fn blocks_fill_exactly_the_series_length() {
        let resampler = StationaryBootstrap::new(97, 8.0, 42).unwrap();

        for replication in 0..50 {
            let mut rng = resampler.replication_rng(replication);
            let blocks = resampler.draw_blocks(&mut rng);

            assert_eq!(blocks.iter().map(|b| b.len).sum::<usize>(), 97);
            assert!(blocks.iter().all(|b| b.len >= 1 && b.len <= 97));
            assert!(blocks.iter().all(|b| b.start < 97));
        }
    }

    #[test]
    fn sub_unit_block_length_gives_single_row_blocks() {
        let resampler = StationaryBootstrap::new(50, 0.5, 3).unwrap();
        let mut rng = resampler.replication_rng(0);

        let blocks = resampler.draw_blocks(&mut rng);
        assert_eq!(blocks.len(), 50);
        assert!(blocks.iter().all(|b| b.len == 1));
    }

    #[test]
    fn block_lengths_average_to_mean_parameter() {
        let resampler = StationaryBootstrap::new(200_000, 10.0, 7).unwrap();
        let mut rng = resampler.replication_rng(0);

        let blocks = resampler.draw_blocks(&mut rng);
        // Drop the final block, which may be truncated
        let complete = &blocks[..blocks.len() - 1];
        let mean = complete.iter().map(|b| b.len as f64).sum::<f64>() / complete.len() as f64;

        assert!((mean - 10.0).abs() < 0.5, "mean block length {mean}");
    }

    #[test]
    fn blocks_wrap_around_to_row_zero() {
        let resampler = StationaryBootstrap::new(10, 9.0, 11).unwrap();
        let mut saw_wrap = false;

        for replication in 0..200 {
            let mut rng = resampler.replication_rng(replication);
            let blocks = resampler.draw_blocks(&mut rng);
            let mut rng = resampler.replication_rng(replication);
            let indices = resampler.resample_indices(&mut rng);

            let mut offset = 0;
            for block in blocks {
                for j in 0..block.len {
                    assert_eq!(indices[offset + j], (block.start + j) % 10);
                }
                saw_wrap |= block.start + block.len > 10;
                offset += block.len;
            }
        }

        assert!(saw_wrap, "long blocks on a short series should wrap");
    }

    // ============================================================
    // Reproducibility
    // ============================================================

    #[test]
    fn same_seed_and_replication_reproduce_indices() {
        let first = StationaryBootstrap::new(120, 6.0, 42).unwrap();
        let second = StationaryBootstrap::new(120, 6.0, 42).unwrap();

        assert_eq!(first.replication_indices(5), second.replication_indices(5));
    }

    #[test]
    fn replications_use_independent_streams() {
        let resampler = StationaryBootstrap::new(120, 6.0, 42).unwrap();

        assert_ne!(
            resampler.replication_indices(0),
            resampler.replication_indices(1)
        );
    }

    #[test]
    fn different_seeds_differ() {
        let a = StationaryBootstrap::new(120, 6.0, 1).unwrap();
        let b = StationaryBootstrap::new(120, 6.0, 2).unwrap();

        assert_ne!(a.replication_indices(0), b.replication_indices(0));
    }

    #[test]
    fn gather_into_reuses_buffer() {
        let mut out = vec![9.0; 5];
        gather_into(&[1.0, 2.0, 3.0], &[2, 0, 0], &mut out);

        assert_eq!(out, vec![3.0, 1.0, 1.0]);
    }
}
