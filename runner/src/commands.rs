pub mod check;
pub mod store;
pub mod visualize;

use crate::{config::ConfigErrors, database::ConnectionError};
use benchwatch_analysis::VisualizeError;
use benchwatch_ingest::IngestError;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid configuration")]
    Config(#[from] ConfigErrors),
    #[error("Database access failed")]
    Connection(#[from] ConnectionError),
    #[error("Ingesting benchmark results failed")]
    Ingest(#[from] IngestError),
    #[error("Rendering visualizations failed")]
    Visualize(#[from] VisualizeError),
}

/// an error and all of its sources joined with `: `
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchwatch_ingest::parse_file;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn chain_carries_the_parse_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[\n  {\"name\": }\n]").unwrap();

        let error = parse_file(&path).unwrap_err();
        let message = error_chain(&error);

        assert!(message.starts_with(&error.to_string()), "{message}");
        assert!(message.contains("line 2"), "{message}");
        assert!(message.len() > error.to_string().len());
    }

    #[test]
    fn chain_walks_every_source() {
        let error = CommandError::from(IngestError::MissingRoot("results".into()));

        let message = error_chain(&error);

        assert!(message.starts_with("Ingesting benchmark results failed: "));
        assert!(message.contains("results"));
    }
}
