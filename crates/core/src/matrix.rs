//! Column-labelled matrix of strategy log returns.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{SpaError, SpaResult};
use crate::sharpe::sharpe_ratio;

/// T x N matrix of log returns, one column per strategy, rows in chronological order.
///
/// Stored column-major because every computation in the test walks a single
/// strategy's series. Construction validates the invariants once so the
/// engine can treat the matrix as trusted, read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMatrix {
    strategies: Vec<String>,
    columns: Vec<Vec<f64>>,
    row_keys: Option<Vec<String>>,
}

impl ReturnMatrix {
    /// Builds a matrix from named columns.
    ///
    /// # Errors
    ///
    /// - [`SpaError::EmptyMatrix`] when there are no strategies or no periods
    /// - [`SpaError::DimensionMismatch`] when names and columns disagree in
    ///   count or columns disagree in length
    /// - [`SpaError::DuplicateStrategy`] when a name repeats
    /// - [`SpaError::MissingValue`] when a cell is NaN or infinite
    pub fn new(strategies: Vec<String>, columns: Vec<Vec<f64>>) -> SpaResult<Self> {
        if strategies.is_empty() || columns.is_empty() {
            return Err(SpaError::EmptyMatrix);
        }
        if strategies.len() != columns.len() {
            return Err(SpaError::DimensionMismatch {
                label: "strategy names".to_string(),
                expected: columns.len(),
                actual: strategies.len(),
            });
        }

        let mut seen = HashSet::with_capacity(strategies.len());
        for name in &strategies {
            if !seen.insert(name.as_str()) {
                return Err(SpaError::DuplicateStrategy(name.clone()));
            }
        }

        let periods = columns[0].len();
        if periods == 0 {
            return Err(SpaError::EmptyMatrix);
        }

        for (name, column) in strategies.iter().zip(&columns) {
            if column.len() != periods {
                return Err(SpaError::DimensionMismatch {
                    label: format!("strategy '{name}'"),
                    expected: periods,
                    actual: column.len(),
                });
            }
            if let Some(period) = column.iter().position(|v| !v.is_finite()) {
                return Err(SpaError::MissingValue {
                    strategy: name.clone(),
                    period,
                });
            }
        }

        Ok(Self {
            strategies,
            columns,
            row_keys: None,
        })
    }

    /// Builds a matrix from chronological rows, each holding one value per strategy.
    ///
    /// # Errors
    ///
    /// Returns [`SpaError::DimensionMismatch`] naming the first row whose
    /// length differs from the number of strategies, plus every error of
    /// [`ReturnMatrix::new`].
    pub fn from_rows(strategies: Vec<String>, rows: &[Vec<f64>]) -> SpaResult<Self> {
        let width = strategies.len();
        let mut columns: Vec<Vec<f64>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SpaError::DimensionMismatch {
                    label: format!("row {i}"),
                    expected: width,
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(*value);
            }
        }

        Self::new(strategies, columns)
    }

    /// Attaches chronological row keys (timestamps or period ids).
    ///
    /// # Errors
    ///
    /// Returns [`SpaError::DimensionMismatch`] when the key count differs from the period count.
    pub fn with_row_keys(mut self, keys: Vec<String>) -> SpaResult<Self> {
        if keys.len() != self.periods() {
            return Err(SpaError::DimensionMismatch {
                label: "row keys".to_string(),
                expected: self.periods(),
                actual: keys.len(),
            });
        }
        self.row_keys = Some(keys);
        Ok(self)
    }

    /// Number of time periods (T).
    #[must_use]
    pub fn periods(&self) -> usize {
        self.columns[0].len()
    }

    /// Number of strategies (N).
    #[must_use]
    pub fn n_strategies(&self) -> usize {
        self.strategies.len()
    }

    /// Strategy identifiers in column order.
    #[must_use]
    pub fn strategies(&self) -> &[String] {
        &self.strategies
    }

    /// Return series of the strategy at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= n_strategies()`.
    #[must_use]
    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Return series of a strategy by identifier.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.strategies
            .iter()
            .position(|s| s == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Iterates `(strategy, series)` pairs in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.strategies
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Row keys, if the loader supplied them.
    #[must_use]
    pub fn row_keys(&self) -> Option<&[String]> {
        self.row_keys.as_deref()
    }

    /// Returns a copy with a per-period risk-free rate subtracted from every cell.
    #[must_use]
    pub fn excess_returns(&self, risk_free_rate: f64) -> Self {
        if risk_free_rate == 0.0 {
            return self.clone();
        }
        Self {
            strategies: self.strategies.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| c.iter().map(|r| r - risk_free_rate).collect())
                .collect(),
            row_keys: self.row_keys.clone(),
        }
    }

    /// Annualized Sharpe ratio of every column.
    ///
    /// # Errors
    ///
    /// Propagates [`sharpe_ratio`] failures with the offending strategy attached.
    pub fn sharpe_ratios(&self, annualization_factor: f64) -> SpaResult<Vec<f64>> {
        self.iter_columns()
            .map(|(name, series)| {
                sharpe_ratio(series, annualization_factor).map_err(|e| e.with_strategy(name))
            })
            .collect()
    }
}
