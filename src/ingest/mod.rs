//! Upload Ingestion
//!
//! Turns uploaded bytes into rows for the profiling pipeline. Format is
//! dispatched on the file extension: CSV (and delimiter-separated text) is
//! parsed here, JSON arrays of objects are accepted directly, and binary
//! spreadsheet/document formats yield zero rows so the pipeline's synthetic
//! fallback takes over. Ingestion failures on a recognized format are real
//! errors; an unrecognized format is not.

pub mod csv_reader;

use serde_json::Value;
use tracing::debug;

use crate::types::{InsightError, Result, Row};

/// Row and column counts recorded on the upload after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadShape {
    pub row_count: usize,
    pub column_count: usize,
}

pub fn upload_shape(rows: &[Row]) -> UploadShape {
    UploadShape {
        row_count: rows.len(),
        column_count: crate::types::column_names(rows).len(),
    }
}

fn extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Parse uploaded bytes into rows.
///
/// Unsupported formats return an empty row set rather than an error; the
/// caller decides whether that means "synthesize" (it does).
pub fn rows_from_bytes(bytes: &[u8], filename: &str) -> Result<Vec<Row>> {
    match extension(filename).as_str() {
        "csv" | "tsv" | "txt" => csv_reader::parse(bytes),
        "json" => rows_from_json(bytes, filename),
        other => {
            debug!(filename, format = other, "unsupported format, no rows parsed");
            Ok(Vec::new())
        }
    }
}

/// Accept a top-level JSON array of flat objects. Non-object elements are
/// skipped; a non-array document is an ingest error.
fn rows_from_json(bytes: &[u8], filename: &str) -> Result<Vec<Row>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| InsightError::ingest(filename, format!("invalid JSON: {e}")))?;
    let Value::Array(elements) = value else {
        return Err(InsightError::ingest(
            filename,
            "expected a top-level JSON array of objects",
        ));
    };
    Ok(elements
        .into_iter()
        .filter_map(|element| match element {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}
