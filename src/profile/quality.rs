//! Data Quality Scorer
//!
//! Computes completeness, consistency, and validity percentages plus a
//! composite score. Never fails: every division is guarded, and a column with
//! zero sampled values contributes a neutral term instead of propagating NaN.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::quality;
use crate::types::{Row, cell_is_populated, cell_to_string, column_names};

/// Quality components, each an integer percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    pub completeness: u8,
    pub consistency: u8,
    pub validity: u8,
    /// round(mean(completeness, consistency, validity))
    pub composite: u8,
}

impl QualityScore {
    pub fn perfect() -> Self {
        Self {
            completeness: 100,
            consistency: 100,
            validity: 100,
            composite: 100,
        }
    }
}

/// Score the dataset. A zero-row or zero-column dataset scores 100 on
/// consistency/validity and 0 on completeness only when rows exist but no
/// cell is populated.
pub fn score(rows: &[Row]) -> QualityScore {
    let columns = column_names(rows);
    let completeness = completeness_pct(rows, &columns);
    let consistency = consistency_pct(rows, &columns);
    let validity = validity_pct(rows, &columns);
    let composite = ((f64::from(completeness) + f64::from(consistency) + f64::from(validity))
        / 3.0)
        .round() as u8;
    QualityScore {
        completeness,
        consistency,
        validity,
        composite,
    }
}

/// Average over columns of (populated count / total rows), as a percentage.
pub fn completeness_pct(rows: &[Row], columns: &[String]) -> u8 {
    if rows.is_empty() || columns.is_empty() {
        return 100;
    }
    let per_column_sum: f64 = columns
        .iter()
        .map(|column| {
            let populated = rows
                .iter()
                .filter(|row| cell_is_populated(row.get(column)))
                .count();
            populated as f64 / rows.len() as f64
        })
        .sum();
    ((per_column_sum / columns.len() as f64) * 100.0).round() as u8
}

/// Per-column completeness percentages, used by the action-item composer.
pub fn per_column_completeness(rows: &[Row], columns: &[String]) -> Vec<(String, f64)> {
    if rows.is_empty() {
        return Vec::new();
    }
    columns
        .iter()
        .map(|column| {
            let populated = rows
                .iter()
                .filter(|row| cell_is_populated(row.get(column)))
                .count();
            (
                column.clone(),
                populated as f64 / rows.len() as f64 * 100.0,
            )
        })
        .collect()
}

/// Primitive JSON type observed at runtime, before any parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PrimitiveKind {
    Text,
    Number,
    Bool,
    Other,
}

fn primitive_kind(value: &Value) -> PrimitiveKind {
    match value {
        Value::String(_) => PrimitiveKind::Text,
        Value::Number(_) => PrimitiveKind::Number,
        Value::Bool(_) => PrimitiveKind::Bool,
        _ => PrimitiveKind::Other,
    }
}

/// Minimum over columns of the fraction of values sharing the column's
/// majority primitive type. Zero columns scores 100; a column with zero
/// populated values is skipped.
pub fn consistency_pct(rows: &[Row], columns: &[String]) -> u8 {
    let mut minimum = 100u8;
    for column in columns {
        let kinds: Vec<PrimitiveKind> = rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| cell_is_populated(Some(v)))
            .map(primitive_kind)
            .collect();
        if kinds.is_empty() {
            continue;
        }
        let majority = [
            PrimitiveKind::Text,
            PrimitiveKind::Number,
            PrimitiveKind::Bool,
            PrimitiveKind::Other,
        ]
        .into_iter()
        .map(|kind| kinds.iter().filter(|k| **k == kind).count())
        .max()
        .unwrap_or(0);
        let pct = (majority as f64 / kinds.len() as f64 * 100.0).round() as u8;
        minimum = minimum.min(pct);
    }
    minimum
}

/// Start at 100 and deduct for suspicious cells over the first 1000 rows:
/// 1 point per over-long value, 2 points per literal "null"/"undefined".
/// Floors at 0.
pub fn validity_pct(rows: &[Row], columns: &[String]) -> u8 {
    let mut score = 100i32;
    for row in rows.iter().take(quality::VALIDITY_SAMPLE_ROWS) {
        for column in columns {
            let Some(value) = row.get(column) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let text = cell_to_string(value);
            if text.len() > quality::MAX_CELL_LEN {
                score -= quality::LONG_CELL_PENALTY;
            }
            if text.contains("null") || text.contains("undefined") {
                score -= quality::LITERAL_NULL_PENALTY;
            }
        }
    }
    score.max(0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_fully_populated_dataset_is_complete() {
        let rows = vec![
            row(&[("a", json!("1")), ("b", json!("x"))]),
            row(&[("a", json!("2")), ("b", json!("y"))]),
        ];
        let score = score(&rows);
        assert_eq!(score.completeness, 100);
        assert_eq!(score.composite, 100);
    }

    #[test]
    fn test_half_empty_column_halves_its_share() {
        let rows = vec![
            row(&[("a", json!("1")), ("b", json!(""))]),
            row(&[("a", json!("2")), ("b", json!("y"))]),
        ];
        // a: 100%, b: 50% -> mean 75%
        assert_eq!(completeness_pct(&rows, &column_names(&rows)), 75);
    }

    #[test]
    fn test_mixed_types_lower_consistency() {
        let rows = vec![
            row(&[("v", json!(1))]),
            row(&[("v", json!(2))]),
            row(&[("v", json!("three"))]),
            row(&[("v", json!(4))]),
        ];
        // majority Number 3/4 = 75%
        assert_eq!(consistency_pct(&rows, &column_names(&rows)), 75);
    }

    #[test]
    fn test_zero_columns_scores_100() {
        assert_eq!(consistency_pct(&[], &[]), 100);
        let score = score(&[]);
        assert_eq!(score.composite, 100);
    }

    #[test]
    fn test_validity_penalizes_literal_null() {
        let rows = vec![
            row(&[("a", json!("null"))]),
            row(&[("a", json!("fine"))]),
            row(&[("a", json!("undefined"))]),
        ];
        assert_eq!(validity_pct(&rows, &column_names(&rows)), 96);
    }

    #[test]
    fn test_validity_floors_at_zero() {
        let rows: Vec<Row> = (0..60).map(|_| row(&[("a", json!("null"))])).collect();
        assert_eq!(validity_pct(&rows, &["a".to_string()]), 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_scores_stay_in_range(cells in proptest::collection::vec(
            proptest::option::of("[a-z0-9]{0,8}"),
            0..120,
        )) {
            let rows: Vec<Row> = cells
                .iter()
                .map(|cell| {
                    let value = match cell {
                        Some(text) => json!(text),
                        None => Value::Null,
                    };
                    row(&[("col", value)])
                })
                .collect();
            let s = score(&rows);
            for component in [s.completeness, s.consistency, s.validity, s.composite] {
                proptest::prop_assert!(component <= 100);
            }
        }
    }

    #[test]
    fn test_components_always_in_range() {
        let rows = vec![
            row(&[("a", json!(null)), ("b", json!("x".repeat(2000)))]),
            row(&[("a", json!("undefined"))]),
        ];
        let s = score(&rows);
        for component in [s.completeness, s.consistency, s.validity, s.composite] {
            assert!(component <= 100);
        }
    }
}
