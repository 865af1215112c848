use crate::{IngestError, Measurement};
use serde::{de::IgnoredAny, Deserialize};
use serde_json::Value;
use std::{fs, path::Path};
use tracing::{debug, trace};

/// name used for entries without a string `name`
pub const UNKNOWN_NAME: &str = "unknown";

#[derive(Deserialize)]
#[serde(untagged)]
enum ResultFile {
    Wrapped { benchmarks: Vec<Value> },
    Bare(Vec<Value>),
    Other(IgnoredAny),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// a recognized layout, including entries that were dropped for lacking an estimate
    Measurements {
        measurements: Vec<Measurement>,
        skipped: usize,
    },
    /// any top-level value that is neither a `benchmarks` object nor a list
    Unsupported,
}

impl Parsed {
    pub fn measurements(&self) -> &[Measurement] {
        match self {
            Self::Measurements { measurements, .. } => measurements,
            Self::Unsupported => &[],
        }
    }
}

/// Extract every `name` / `mean.point_estimate` pair from a result document
///
/// Accepts `{"benchmarks": [...]}` or a bare list. Entries that are not objects or carry no
/// numeric point estimate are skipped.
pub fn parse_results(input: &str) -> Result<Parsed, IngestError> {
    let entries = match serde_json::from_str::<ResultFile>(input)? {
        ResultFile::Wrapped { benchmarks } => benchmarks,
        ResultFile::Bare(entries) => entries,
        ResultFile::Other(_) => return Ok(Parsed::Unsupported),
    };

    let total = entries.len();
    let measurements = entries.iter().filter_map(extract).collect::<Vec<_>>();
    let skipped = total - measurements.len();

    if skipped > 0 {
        debug!(total = total, skipped = skipped, "Skipped entries without a point estimate");
    }

    Ok(Parsed::Measurements {
        measurements,
        skipped,
    })
}

pub fn parse_file(path: &Path) -> Result<Parsed, IngestError> {
    let content = fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match parse_results(&content) {
        Err(IngestError::Json(source)) => Err(IngestError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        result => result,
    }
}

fn extract(entry: &Value) -> Option<Measurement> {
    let entry = entry.as_object()?;
    let value = entry
        .get("mean")
        .and_then(|mean| mean.get("point_estimate"))
        .and_then(Value::as_f64)?;
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_NAME);

    trace!(name = name, value = value, "Extracted point estimate");

    Some(Measurement::new(name, value))
}
