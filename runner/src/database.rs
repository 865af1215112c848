pub mod sqlite;


pub use sqlite::Connection;

use benchwatch_ingest::Measurement;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("SQLite Error")]
    SQLite(#[source] rusqlite::Error),
}

#[derive(Debug, Clone)]
/// everything persisted by a single ingestion, written as one transaction
pub struct Ingestion<'a> {
    pub commit_sha: &'a str,
    pub branch: &'a str,
    pub metric_category: &'a str,
    pub measurements: &'a [Measurement],
}
