//! Discovery and extraction of benchmark point estimates from result files.

pub mod collector;
pub mod criterion;

pub use collector::Collector;
pub use criterion::{parse_file, parse_results, Parsed};

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Results directory {} does not exist or is not a directory", .0.display())]
    MissingRoot(PathBuf),
    #[error("Glob was invalid")]
    InvalidGlob(#[from] globset::Error),
    #[error("Failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse benchmark results")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// a single named point estimate extracted from a result file
pub struct Measurement {
    pub name: String,
    pub value: f64,
}

impl Measurement {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
