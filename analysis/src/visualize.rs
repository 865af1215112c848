mod interactive;
mod trend;

use crate::BenchmarkRecord;
use chrono::DateTime;
use itertools::Itertools;
use plotters::drawing::DrawingAreaErrorKind;
use std::{
    collections::HashSet,
    error::Error as StdError,
    fs, io,
    ops::Range,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum VisualizeError {
    #[error("Failed to create output directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to draw chart: {0}")]
    Drawing(String),
}

impl<E: StdError + Send + Sync> From<DrawingAreaErrorKind<E>> for VisualizeError {
    fn from(error: DrawingAreaErrorKind<E>) -> Self {
        VisualizeError::Drawing(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    /// file name of the combined interactive chart
    pub trends_file: String,
    pub width: u32,
    pub height: u32,
    pub trend_width: u32,
    pub trend_height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            trends_file: "benchmark_trends.html".to_owned(),
            width: 1200,
            height: 600,
            trend_width: 1000,
            trend_height: 400,
        }
    }
}

/// all records of one metric, ordered by timestamp then id
#[derive(Debug)]
pub(crate) struct Series<'a> {
    pub name: &'a str,
    pub records: Vec<&'a BenchmarkRecord>,
}

impl Series<'_> {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.records
            .iter()
            .map(|record| (seconds(record), record.value))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Visualizer {
    options: ChartOptions,
}

impl Visualizer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    /// Write the combined chart plus one trend image per metric into `out_dir`
    ///
    /// Returns the written files, nothing is written for an empty record set.
    pub fn render(
        &self,
        records: &[BenchmarkRecord],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, VisualizeError> {
        fs::create_dir_all(out_dir).map_err(|source| VisualizeError::CreateDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        if records.is_empty() {
            info!("No records to visualize");

            return Ok(Vec::new());
        }

        let series = group_series(records);
        let mut written = Vec::with_capacity(series.len() + 1);

        let document = interactive::render(
            &series,
            records.len(),
            (self.options.width, self.options.height),
        )?;
        let path = out_dir.join(&self.options.trends_file);
        fs::write(&path, document).map_err(|source| VisualizeError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = ?path, "Wrote interactive chart");
        written.push(path);

        let mut used = HashSet::from([self.options.trends_file.clone()]);

        for metric in series.iter() {
            let path = out_dir.join(unique_trend_file_name(metric.name, &mut used));

            trend::render(
                metric,
                &path,
                (self.options.trend_width, self.options.trend_height),
            )?;
            debug!(path = ?path, metric = metric.name, "Wrote trend chart");
            written.push(path);
        }

        info!(files = written.len(), "Rendered visualizations");

        Ok(written)
    }
}

pub(crate) fn group_series(records: &[BenchmarkRecord]) -> Vec<Series<'_>> {
    records
        .iter()
        .map(|record| record.metric_name.as_str())
        .unique()
        .map(|name| Series {
            name,
            records: records
                .iter()
                .filter(|record| record.metric_name == name)
                .sorted_by_key(|record| (record.timestamp, record.id))
                .collect_vec(),
        })
        .collect_vec()
}

/// file name for a metric's trend chart, anything outside `[A-Za-z0-9._-]` becomes `_`
pub fn trend_file_name(metric: &str) -> String {
    format!("{}_trend.svg", sanitize(metric))
}

fn sanitize(metric: &str) -> String {
    metric
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// [`trend_file_name`] suffixed with `_2`, `_3`, ... until it is not in `used`
///
/// Distinct metrics can sanitise to the same name, `group/bench` and `group_bench` both do.
pub(crate) fn unique_trend_file_name(metric: &str, used: &mut HashSet<String>) -> String {
    let mut name = trend_file_name(metric);
    let stem = sanitize(metric);
    let mut suffix = 2;

    while used.contains(&name) {
        name = format!("{stem}_{suffix}_trend.svg");
        suffix += 1;
    }
    used.insert(name.clone());

    name
}

/// x axis margin when every point shares one timestamp
pub(crate) const FLAT_TIME_PAD: f64 = 60.0;

pub(crate) fn seconds(record: &BenchmarkRecord) -> f64 {
    record.timestamp.and_utc().timestamp() as f64
}

pub(crate) fn format_timestamp(seconds: &f64) -> String {
    DateTime::from_timestamp(seconds.round() as i64, 0)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Value range with a 5% margin
///
/// When every value is identical the range is widened by `flat_pad`, or by 5% of the value
/// (at least 1.0) when no pad is given.
pub(crate) fn padded_range(
    values: impl Iterator<Item = f64>,
    flat_pad: Option<f64>,
) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
        (min.min(value), max.max(value))
    });

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let span = max - min;
    let pad = if span > 0.0 {
        span * 0.05
    } else if let Some(pad) = flat_pad {
        pad
    } else if min != 0.0 {
        min.abs() * 0.05
    } else {
        1.0
    };

    (min - pad)..(max + pad)
}
