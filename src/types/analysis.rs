//! Analysis result model.
//!
//! These are the payload shapes the profiling pipeline produces and the
//! storage layer persists as JSON. Payload fields are write-once per run:
//! the pipeline computes a complete payload or the run fails wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle of an upload or analysis run: Pending -> Processing -> terminal.
///
/// There is no partial-success state; a run either completes with a full
/// payload or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Whether a payload was derived from observed rows or fully simulated.
///
/// The fallback generator produces plausible but simulated content; callers
/// must not present Synthetic output as derived from observed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Observed,
    Synthetic,
}

// =============================================================================
// KPIs
// =============================================================================

/// Direction a metric is moving, as rendered on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// KPI values are either numeric or display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KpiValue {
    Number(f64),
    Text(String),
}

impl From<f64> for KpiValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for KpiValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One KPI card. A result set is capped at 6 records, ordered by generation
/// priority (scale and quality first, then domain-specific, then statistical).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiRecord {
    pub name: String,
    pub value: KpiValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
    pub trend: TrendDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl KpiRecord {
    pub fn new(name: impl Into<String>, value: impl Into<KpiValue>, trend: TrendDirection) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: None,
            change: None,
            trend,
            change_percent: None,
            icon: None,
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn change(mut self, change: impl Into<String>) -> Self {
        self.change = Some(change.into());
        self
    }

    pub fn change_percent(mut self, pct: i64) -> Self {
        self.change_percent = Some(pct);
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

// =============================================================================
// Trends and charts
// =============================================================================

/// One point in the 12-month trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Calendar month abbreviation, Jan..Dec
    pub period: String,
    /// Non-negative, rounded to 2 decimals
    pub value: f64,
    /// ISO date for the first of the month
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

/// Renderable chart description handed to the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub description: String,
    pub data: Vec<Value>,
    pub x_axis: String,
    pub y_axis: String,
    pub color: String,
}

// =============================================================================
// Action items
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
}

/// Recommended follow-up generated from the analysis, capped at 4 per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    pub status: ActionStatus,
}

// =============================================================================
// Summary
// =============================================================================

/// Headline statistics for the summary block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_records: usize,
    pub date_range: String,
    pub completeness: u8,
    /// Derived display figure: min(95 + completeness/10, 99)
    pub accuracy: u8,
    pub columns: usize,
    pub numeric_columns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub executive: String,
    pub key_findings: Vec<String>,
    pub statistics: SummaryStatistics,
}

// =============================================================================
// Payload and records
// =============================================================================

/// The complete output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub summary: AnalysisSummary,
    pub kpis: Vec<KpiRecord>,
    pub trends: Vec<TrendPoint>,
    pub visualizations: Vec<ChartSpec>,
    pub insights: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub origin: DataOrigin,
}

/// Persisted analysis run. Identity and storage belong to the record store;
/// the pipeline only ever produces the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub upload_id: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<AnalysisPayload>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Persisted uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub blob_path: String,
    pub status: RunStatus,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_round_trip() {
        for status in [
            RunStatus::Pending,
            RunStatus::Processing,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("DONE"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Processing.is_terminal());
    }

    #[test]
    fn test_kpi_value_serializes_untagged() {
        let numeric = serde_json::to_string(&KpiValue::Number(42.0)).unwrap();
        assert_eq!(numeric, "42.0");
        let text = serde_json::to_string(&KpiValue::Text("High".to_string())).unwrap();
        assert_eq!(text, "\"High\"");
    }

    #[test]
    fn test_kpi_builder() {
        let kpi = KpiRecord::new("Churn Rate", 12.0, TrendDirection::Stable)
            .unit("%")
            .change("Moderate")
            .change_percent(12)
            .icon("Users");
        assert_eq!(kpi.unit.as_deref(), Some("%"));
        assert_eq!(kpi.change_percent, Some(12));
    }
}
