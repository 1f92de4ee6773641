//! Core domain types.
//!
//! The dataset model is deliberately loose: a [`Row`] is an ordered-insertion
//! mapping from column name to a raw JSON value, exactly as produced by the
//! ingest layer. Rows are assumed (not guaranteed) to share a column set, so
//! every consumer tolerates missing keys per row.

pub mod analysis;
pub mod error;

pub use analysis::{
    ActionItem, ActionStatus, AnalysisPayload, AnalysisRecord, AnalysisSummary, ChartKind,
    ChartSpec, DataOrigin, KpiRecord, KpiValue, Priority, RunStatus, SummaryStatistics,
    TrendDirection, TrendPoint, UploadRecord,
};
pub use error::{InsightError, Result, ResultExt};

use serde_json::Value;

/// One record of a dataset: column name -> raw cell value.
///
/// `serde_json::Map` preserves insertion order (the `preserve_order` feature),
/// which keeps column enumeration stable across analysis runs.
pub type Row = serde_json::Map<String, Value>;

/// Column names in first-seen order across the whole dataset.
///
/// The first row usually carries the full set, but rows with extra or missing
/// keys are tolerated: later rows contribute any columns not yet seen.
pub fn column_names(rows: &[Row]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }
    names
}

/// Whether a cell counts as populated (non-null and non-empty-string).
pub fn cell_is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// String form of a cell value, as the validity scanner sees it.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
