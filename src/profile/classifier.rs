//! Column Classifier
//!
//! Infers which columns of a schema-less dataset are numeric, categorical,
//! or date-like. Classification is a pure function over the row slice and is
//! idempotent; callers treat an all-empty result as "insufficient data" and
//! skip dependent analyses.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::constants::classify;
use crate::types::{Row, cell_is_populated, column_names};

/// Column kinds derived for one analysis run. Never persisted independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnClassification {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub date_like: Vec<String>,
}

impl ColumnClassification {
    /// True when no column qualified for any kind.
    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty() && self.categorical.is_empty() && self.date_like.is_empty()
    }
}

/// Classify every column of the dataset.
///
/// A zero-row dataset (or rows with no keys) yields an all-empty
/// classification rather than an error.
pub fn classify(rows: &[Row]) -> ColumnClassification {
    if rows.is_empty() {
        return ColumnClassification::default();
    }

    let columns = column_names(rows);
    let sample = &rows[..rows.len().min(classify::SAMPLE_ROWS)];

    let mut result = ColumnClassification::default();
    for column in &columns {
        if is_numeric_column(sample, column) {
            result.numeric.push(column.clone());
        }
        if is_categorical_column(sample, column) {
            result.categorical.push(column.clone());
        }
        if is_date_column(sample, column) {
            result.date_like.push(column.clone());
        }
    }
    result
}

/// A column is numeric when at least 80% of its non-empty sampled values
/// parse as finite numbers.
fn is_numeric_column(sample: &[Row], column: &str) -> bool {
    let values: Vec<&Value> = sample
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|v| cell_is_populated(Some(v)))
        .collect();
    if values.is_empty() {
        return false;
    }
    let numeric = values.iter().filter(|v| parse_numeric(v).is_some()).count();
    numeric as f64 / values.len() as f64 >= classify::NUMERIC_RATIO
}

/// A column is categorical when its values repeat meaningfully: more than one
/// distinct value, at most 20, and distinct count under 80% of the populated
/// count (anything denser is a near-unique identifier).
fn is_categorical_column(sample: &[Row], column: &str) -> bool {
    let values: Vec<String> = sample
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|v| cell_is_populated(Some(v)))
        .map(crate::types::cell_to_string)
        .collect();
    if values.is_empty() {
        return false;
    }
    let mut distinct: Vec<&String> = Vec::new();
    for value in &values {
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    distinct.len() > 1
        && distinct.len() <= classify::MAX_CATEGORY_CARDINALITY
        && (distinct.len() as f64) < values.len() as f64 * classify::IDENTIFIER_RATIO
}

fn is_date_column(sample: &[Row], column: &str) -> bool {
    let values: Vec<&Value> = sample
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|v| cell_is_populated(Some(v)))
        .collect();
    if values.is_empty() {
        return false;
    }
    let dates = values.iter().filter(|v| is_date_like(v)).count();
    dates as f64 / values.len() as f64 >= classify::NUMERIC_RATIO
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // ISO, MM/DD/YYYY, MM-DD-YYYY
        Regex::new(r"^(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{2}-\d{2}-\d{4})")
            .expect("date pattern is a valid regex")
    })
}

/// Whether a single cell looks like a date: pattern match or generic parse.
pub fn is_date_like(value: &Value) -> bool {
    let Value::String(s) = value else {
        return false;
    };
    let s = s.trim();
    if s.is_empty() {
        return false;
    }
    if date_pattern().is_match(s) {
        return true;
    }
    parse_date(s).is_some()
}

/// Generic date parsing over the formats the dashboard has seen in the wild.
pub fn parse_date(s: &str) -> Option<chrono::NaiveDate> {
    const FORMATS: [&str; 6] = [
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%m-%d-%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%B %d, %Y",
    ];
    let s = s.trim();
    for format in FORMATS {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .ok()
}

/// Parse a raw cell as a finite number, tolerating currency symbols, commas,
/// percent signs, and whitespace ("$1,234.50" -> 1234.5).
pub fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}
