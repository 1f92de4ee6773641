//! Statistical Analyzer
//!
//! Distribution stats, z-score outlier detection, and pairwise Pearson
//! correlation over the numeric columns. All accumulation is written as
//! explicit folds over immutable value slices; formulas use the population
//! standard deviation and the standard product-moment correlation.

use crate::constants::stats;
use crate::profile::classifier::parse_numeric;
use crate::types::Row;

/// Distribution summary for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// A reported strong correlation (|r| > 0.5).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationPair {
    pub left: String,
    pub right: String,
    pub coefficient: f64,
}

/// Valid (finite) numeric values for a column, in row order.
pub fn numeric_values(rows: &[Row], column: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter_map(parse_numeric)
        .collect()
}

/// Distribution stats for one column; None when no value parses.
pub fn column_stats(rows: &[Row], column: &str) -> Option<ColumnStats> {
    let values = numeric_values(rows, column);
    if values.is_empty() {
        return None;
    }
    let count = values.len();
    let sum = values.iter().fold(0.0, |acc, v| acc + v);
    let mean = sum / count as f64;
    let min = values.iter().fold(f64::INFINITY, |acc, v| acc.min(*v));
    let max = values.iter().fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
    let variance = values
        .iter()
        .fold(0.0, |acc, v| acc + (v - mean).powi(2))
        / count as f64;
    Some(ColumnStats {
        name: column.to_string(),
        count,
        mean,
        min,
        max,
        sum,
        std_dev: variance.sqrt(),
    })
}

/// Count outliers in one column: values more than 3 population standard
/// deviations from the mean. Columns with fewer than 10 valid values are
/// skipped entirely rather than making partial-sample claims.
pub fn outlier_count(rows: &[Row], column: &str) -> usize {
    let values = numeric_values(rows, column);
    if values.len() < stats::MIN_OUTLIER_SAMPLE {
        return 0;
    }
    let count = values.len() as f64;
    let mean = values.iter().fold(0.0, |acc, v| acc + v) / count;
    let std_dev = (values
        .iter()
        .fold(0.0, |acc, v| acc + (v - mean).powi(2))
        / count)
        .sqrt();
    values
        .iter()
        .filter(|v| (*v - mean).abs() > stats::OUTLIER_SIGMA * std_dev)
        .count()
}

/// Total outliers across all numeric columns.
pub fn total_outliers(rows: &[Row], numeric_columns: &[String]) -> usize {
    numeric_columns
        .iter()
        .fold(0, |acc, column| acc + outlier_count(rows, column))
}

/// Pearson correlation coefficient over paired valid values.
///
/// Pairs with fewer than 10 joint observations yield 0 (treated as "no
/// correlation", not "unknown"); a zero denominator also yields 0.
pub fn correlation(rows: &[Row], left: &str, right: &str) -> f64 {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| {
            let x = row.get(left).and_then(parse_numeric)?;
            let y = row.get(right).and_then(parse_numeric)?;
            Some((x, y))
        })
        .collect();
    if pairs.len() < stats::MIN_CORRELATION_PAIRS {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx, sum_yy) = pairs.iter().fold(
        (0.0, 0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx, syy), (x, y)| (sx + x, sy + y, sxy + x * y, sxx + x * x, syy + y * y),
    );

    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_xx - sum_x * sum_x) * (n * sum_yy - sum_y * sum_y)).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Strong correlations over a bounded pair grid: i in the first 3 numeric
/// columns, j in the first 4, i < j. The bound keeps the scan O(1) in the
/// column count for wide datasets.
pub fn strong_correlations(rows: &[Row], numeric_columns: &[String]) -> Vec<CorrelationPair> {
    let mut found = Vec::new();
    if numeric_columns.len() < 2 {
        return found;
    }
    let left_limit = numeric_columns.len().min(stats::CORRELATION_LEFT_LIMIT);
    let right_limit = numeric_columns.len().min(stats::CORRELATION_RIGHT_LIMIT);
    for i in 0..left_limit {
        for j in (i + 1)..right_limit {
            let r = correlation(rows, &numeric_columns[i], &numeric_columns[j]);
            if r.abs() > stats::STRONG_CORRELATION {
                found.push(CorrelationPair {
                    left: numeric_columns[i].clone(),
                    right: numeric_columns[j].clone(),
                    coefficient: r,
                });
            }
        }
    }
    found
}
