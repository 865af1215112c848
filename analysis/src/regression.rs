use crate::BenchmarkRecord;
use itertools::Itertools;
use std::{fmt, num::ParseFloatError, str::FromStr};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_THRESHOLD: f64 = 5.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("Threshold must be a finite percentage, got {0}")]
    NotFinite(f64),
    #[error("Threshold must not be negative, got {0}")]
    Negative(f64),
    #[error("Threshold is not a number")]
    Parse(#[from] ParseFloatError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Allowed slowdown in percent before a metric counts as regressed
pub struct Threshold(f64);

impl Threshold {
    pub fn new(percentage: f64) -> Result<Self, ThresholdError> {
        if !percentage.is_finite() {
            Err(ThresholdError::NotFinite(percentage))
        } else if percentage < 0.0 {
            Err(ThresholdError::Negative(percentage))
        } else {
            Ok(Self(percentage))
        }
    }

    pub fn percentage(&self) -> f64 {
        self.0
    }

    pub fn factor(&self) -> f64 {
        1.0 + self.0 / 100.0
    }

    /// strictly above the allowed bound, a value exactly on it passes
    pub fn exceeded(&self, current: f64, baseline: f64) -> bool {
        current > baseline * self.factor()
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = ThresholdError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value.trim().parse()?)
    }
}

/// always carries a decimal point, `5.0` rather than `5`
impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub metric: String,
    pub current_mean: f64,
    pub baseline_mean: f64,
    pub threshold: Threshold,
    pub regressed: bool,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.3} > {:.3} (+{}% threshold)",
            self.metric, self.current_mean, self.baseline_mean, self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// no rows for the current commit or none for the baseline branch
    NoData,
    Compared {
        comparisons: Vec<Comparison>,
        /// metrics of the current commit the baseline never measured
        skipped: Vec<String>,
    },
}

impl Report {
    pub fn regressions(&self) -> impl Iterator<Item = &Comparison> {
        let comparisons = match self {
            Self::NoData => &[][..],
            Self::Compared { comparisons, .. } => comparisons.as_slice(),
        };

        comparisons.iter().filter(|comparison| comparison.regressed)
    }

    pub fn passed(&self) -> bool {
        self.regressions().next().is_none()
    }
}

/// Compare the mean of every metric of `current_commit` against its mean on `baseline_branch`
///
/// The baseline is every row of the branch, including rows of the current commit if it was
/// ingested on that branch. Metrics are reported in order of first appearance.
pub fn check(
    records: &[BenchmarkRecord],
    current_commit: &str,
    baseline_branch: &str,
    threshold: Threshold,
) -> Report {
    let current = records
        .iter()
        .filter(|record| record.commit_sha == current_commit)
        .collect_vec();
    let baseline = records
        .iter()
        .filter(|record| record.branch == baseline_branch)
        .collect_vec();

    if current.is_empty() || baseline.is_empty() {
        debug!(
            current = current.len(),
            baseline = baseline.len(),
            "Nothing to compare"
        );

        return Report::NoData;
    }

    let mut comparisons = Vec::new();
    let mut skipped = Vec::new();

    for metric in current.iter().map(|record| record.metric_name.as_str()).unique() {
        let Some(current_mean) = mean_of(&current, metric) else {
            continue;
        };

        match mean_of(&baseline, metric) {
            Some(baseline_mean) => {
                let regressed = threshold.exceeded(current_mean, baseline_mean);

                debug!(
                    metric = metric,
                    current = current_mean,
                    baseline = baseline_mean,
                    regressed = regressed,
                    "Compared metric"
                );

                comparisons.push(Comparison {
                    metric: metric.to_owned(),
                    current_mean,
                    baseline_mean,
                    threshold,
                    regressed,
                });
            }
            None => {
                debug!(metric = metric, "No baseline for metric, skipping");
                skipped.push(metric.to_owned());
            }
        }
    }

    Report::Compared {
        comparisons,
        skipped,
    }
}

fn mean_of(records: &[&BenchmarkRecord], metric: &str) -> Option<f64> {
    let (sum, count) = records
        .iter()
        .filter(|record| record.metric_name == metric)
        .fold((0.0, 0usize), |(sum, count), record| {
            (sum + record.value, count + 1)
        });

    (count > 0).then(|| sum / count as f64)
}
