//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Design Principles
//!
//! - Single unified error type (InsightError) for the entire application
//! - No retries in the core: every failure is handled by an immediate
//!   deterministic fallback or propagated once
//! - No panic/unwrap in non-test code - all errors are recoverable

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, InsightError>;

#[derive(Debug, Error)]
pub enum InsightError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    #[error("Record not found: {kind} {id}")]
    RecordNotFound { kind: &'static str, id: String },

    #[error("Ingest error in {source_name}: {message}")]
    Ingest {
        source_name: String,
        message: String,
    },

    #[error("Completion service error: {0}")]
    Completion(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl InsightError {
    /// Storage-layer error with context
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Read/parse failure inside the ingest layer.
    ///
    /// These are recovered by returning an empty row sequence and are never
    /// surfaced to callers.
    pub fn ingest(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingest {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Extension trait for attaching context to results, used by the storage
/// layer to wrap low-level pool and SQL errors.
pub trait ResultExt<T> {
    fn with_context(self, context: &str) -> Result<T>;
    fn with_context_fn(self, f: impl FnOnce() -> String) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| InsightError::Storage(format!("{}: {}", context, e)))
    }

    fn with_context_fn(self, f: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| InsightError::Storage(format!("{}: {}", f(), e)))
    }
}
