//! Global Constants
//!
//! Centralized constants for profiling thresholds and synthetic generation.
//! All magic numbers should be defined here with documentation.

/// Column classification constants
pub mod classify {
    /// Rows sampled when inferring column kinds
    pub const SAMPLE_ROWS: usize = 100;

    /// Fraction of sampled values that must parse numerically
    pub const NUMERIC_RATIO: f64 = 0.8;

    /// Maximum distinct values for a categorical column
    pub const MAX_CATEGORY_CARDINALITY: usize = 20;

    /// Distinct-to-populated ratio above which a column is a near-unique identifier
    pub const IDENTIFIER_RATIO: f64 = 0.8;
}

/// Data quality scoring constants
pub mod quality {
    /// Rows scanned by the validity check
    pub const VALIDITY_SAMPLE_ROWS: usize = 1000;

    /// Cell length beyond which a value is considered suspicious
    pub const MAX_CELL_LEN: usize = 1000;

    /// Penalty for an over-long cell
    pub const LONG_CELL_PENALTY: i32 = 1;

    /// Penalty for a cell containing a literal "null"/"undefined"
    pub const LITERAL_NULL_PENALTY: i32 = 2;
}

/// Statistical analysis constants
pub mod stats {
    /// Minimum valid values before a column participates in outlier detection
    pub const MIN_OUTLIER_SAMPLE: usize = 10;

    /// Z-score threshold for flagging an outlier
    pub const OUTLIER_SIGMA: f64 = 3.0;

    /// Minimum joint observations before a correlation is trusted
    pub const MIN_CORRELATION_PAIRS: usize = 10;

    /// |r| above which a pair is reported as strongly correlated
    pub const STRONG_CORRELATION: f64 = 0.5;

    /// Pair enumeration limits: i < LEFT_LIMIT, j < RIGHT_LIMIT
    pub const CORRELATION_LEFT_LIMIT: usize = 3;
    pub const CORRELATION_RIGHT_LIMIT: usize = 4;
}

/// Trend synthesis constants
pub mod trends {
    /// Month labels for the fixed 12-point series
    pub const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    /// Valid values required before the real-data path runs
    pub const MIN_REAL_VALUES: usize = 12;

    /// Points the real-data series must keep after the validity gate
    pub const MIN_VALID_POINTS: usize = 8;

    /// Uniform fluctuation applied in distribution mode (fraction of base)
    pub const REAL_FLUCTUATION: f64 = 0.10;

    /// Quarterly business-cycle amplitude in the synthetic model
    pub const CYCLE_AMPLITUDE: f64 = 0.08;
}

/// Composer limits
pub mod compose {
    /// Maximum KPI records per analysis
    pub const MAX_KPIS: usize = 6;

    /// Maximum action items per analysis
    pub const MAX_ACTION_ITEMS: usize = 4;

    /// Categories rendered in the bar chart
    pub const MAX_CHART_CATEGORIES: usize = 8;

    /// Column completeness below which a data-quality action item fires
    pub const COMPLETENESS_ACTION_THRESHOLD: f64 = 80.0;

    /// Row count below which a sample-size action item fires
    pub const SMALL_DATASET_ROWS: usize = 100;

    /// Row count above which a large-dataset action item fires
    pub const LARGE_DATASET_ROWS: usize = 50_000;
}

/// Chat context constants
pub mod chat {
    /// Recent analyses injected into the prompt
    pub const MAX_CONTEXT_ANALYSES: usize = 3;

    /// KPI name/value pairs quoted per analysis
    pub const MAX_CONTEXT_KPIS: usize = 3;

    /// Follow-up suggestions returned with every response
    pub const MAX_SUGGESTIONS: usize = 3;
}
