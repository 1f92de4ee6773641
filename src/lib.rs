//! InsightBoard - Heuristic BI Dashboard Analysis Engine
//!
//! Turns uploaded tabular files into dashboard-ready analysis payloads:
//! KPIs, a 12-month trend series, chart specs, insight sentences, and
//! recommended action items, plus a chat endpoint that answers questions
//! about recent analyses through an LLM provider.
//!
//! ## Core Features
//!
//! - **Profiling Pipeline**: column classification, quality scoring,
//!   outlier and correlation detection, business-domain heuristics
//! - **Trend Synthesis**: always exactly 12 monthly points, from observed
//!   values when possible and domain-shaped simulation otherwise
//! - **Never-Fail Analysis**: unreadable files degrade to a clearly flagged
//!   synthetic payload instead of an error
//! - **Async Runs**: analyses execute on background tasks, observable by
//!   polling Pending -> Processing -> Completed/Failed
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use insightboard::{AnalysisService, ChatService, Database, FsBlobStore};
//!
//! let db = Arc::new(Database::open("records.db")?);
//! let blobs = Arc::new(FsBlobStore::new("blobs"));
//! let service = AnalysisService::new(db, blobs, ChatService::new(None), None);
//!
//! let upload = service.upload("sales.csv", "text/csv", bytes).await?;
//! let run = service.start_analysis(&upload.id).await?;
//! ```
//!
//! ## Modules
//!
//! - [`profile`]: the pure rows-to-payload pipeline
//! - [`ingest`]: delimiter-sniffing CSV/JSON parsing
//! - [`storage`]: SQLite records plus a filesystem blob store
//! - [`service`]: background-run orchestration
//! - [`ai`]: completion provider abstraction and the chat service

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod ingest;
pub mod profile;
pub mod service;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error types
pub use types::error::{InsightError, Result, ResultExt};

// Data model
pub use types::{
    AnalysisPayload, AnalysisRecord, DataOrigin, KpiRecord, Row, RunStatus, TrendPoint,
    UploadRecord,
};

// Services
pub use ai::{ChatService, CompletionProvider};
pub use service::AnalysisService;
pub use storage::{BlobStore, Database, FsBlobStore};
