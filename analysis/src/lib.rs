//! Read side of the benchmark store: the record model, regression comparison and charts.

pub mod regression;
pub mod visualize;

pub use regression::{check, Comparison, Report, Threshold, ThresholdError};
pub use visualize::{ChartOptions, VisualizeError, Visualizer};

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
/// one measured metric of one ingestion, as persisted in `benchmarks`
pub struct BenchmarkRecord {
    pub id: i64,
    pub commit_sha: String,
    pub branch: String,
    pub metric_category: String,
    pub metric_name: String,
    pub value: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
/// one ingestion event, as persisted in `runs`
pub struct RunRecord {
    pub id: i64,
    pub commit_sha: String,
    pub branch: String,
    pub run_time: NaiveDateTime,
}
