//! Return-table loader.
//!
//! Reads a CSV whose first column is the row key (timestamp or period id) and
//! whose remaining columns hold one return series per strategy.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use spa_core::ReturnMatrix;

/// Loads a return table into a [`ReturnMatrix`].
///
/// Rows are put in chronological order when every key parses as an RFC 3339
/// timestamp or a `YYYY-MM-DD` date; otherwise file order is kept. Empty cells
/// are read as missing values and rejected by the matrix.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened or is not valid CSV
/// - The header has no strategy columns
/// - A cell is not a number
/// - The resulting matrix is invalid (ragged, duplicate names, missing values)
pub fn load_returns(path: impl AsRef<Path>) -> Result<ReturnMatrix> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open return table {}", path.display()))?;

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        bail!(
            "Return table {} needs a key column and at least one strategy column",
            path.display()
        );
    }
    let strategies: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut keys = Vec::new();
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", line + 1))?;
        keys.push(record[0].trim().to_string());

        let row = record
            .iter()
            .skip(1)
            .zip(&strategies)
            .map(|(cell, name)| parse_cell(cell, name, line))
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    if let Some(order) = chronological_order(&keys) {
        keys = order.iter().map(|&i| keys[i].clone()).collect();
        rows = order.iter().map(|&i| rows[i].clone()).collect();
    }

    let matrix = ReturnMatrix::from_rows(strategies, &rows)
        .and_then(|m| m.with_row_keys(keys))
        .with_context(|| format!("Invalid return table {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        strategies = matrix.n_strategies(),
        periods = matrix.periods(),
        "Loaded return table"
    );
    Ok(matrix)
}

fn parse_cell(cell: &str, strategy: &str, line: usize) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .with_context(|| format!("Invalid return '{cell}' for '{strategy}' in row {}", line + 1))
}

/// Parses a row key as an RFC 3339 timestamp or a plain date.
fn parse_key(key: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(key) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Stable chronological permutation of the rows, if every key is a date.
fn chronological_order(keys: &[String]) -> Option<Vec<usize>> {
    let parsed: Vec<NaiveDateTime> = keys.iter().map(|k| parse_key(k)).collect::<Option<_>>()?;
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by_key(|&i| parsed[i]);
    Some(order)
}
