//! Command-Line Interface
//!
//! Thin command handlers over [`AnalysisService`](crate::service::AnalysisService).
//! Output formatting lives here; all behavior lives in the service and below.

pub mod commands;
