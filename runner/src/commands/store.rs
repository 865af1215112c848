use super::{error_chain, CommandError};
use crate::{
    config::{IngestConfig, OnError},
    database::{Connection, Ingestion},
};
use benchwatch_ingest::{parse_file, Collector, Parsed};
use clap::{builder::NonEmptyStringValueParser, Args};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory with benchmark JSON results, searched recursively
    #[arg(long)]
    pub results_dir: PathBuf,

    /// SQLite database file, created if missing
    #[arg(long)]
    pub db_file: PathBuf,

    /// Commit SHA the results belong to
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub commit_sha: String,

    /// Branch name the results belong to
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub run: i64,
    /// result files found below the results directory
    pub files: usize,
    /// files that could not be read or parsed
    pub skipped: usize,
    /// files with a top-level layout that holds no benchmark list
    pub unsupported: usize,
    pub stored: usize,
}

/// Read every result file and persist its point estimates as one run
pub fn run(args: &StoreArgs, config: &IngestConfig) -> Result<IngestSummary, CommandError> {
    let collector = Collector::load(&args.results_dir, &config.glob)?;
    let files = collector.len();
    info!(files = files, results_dir = ?args.results_dir, "Collected result files");

    let mut measurements = Vec::new();
    let mut skipped = 0;
    let mut unsupported = 0;

    for path in collector {
        match parse_file(&path) {
            Ok(Parsed::Measurements {
                measurements: found,
                skipped: dropped,
            }) => {
                debug!(path = ?path, found = found.len(), dropped = dropped, "Parsed result file");
                measurements.extend(found);
            }
            Ok(Parsed::Unsupported) => {
                warn!(path = ?path, "Unsupported result layout, skipping file");
                unsupported += 1;
            }
            Err(error) => match config.on_error {
                OnError::Skip => {
                    warn!(
                        error = %error_chain(&error),
                        path = ?path,
                        "Skipping unreadable result file"
                    );
                    skipped += 1;
                }
                OnError::Abort => {
                    error!(
                        error = %error_chain(&error),
                        path = ?path,
                        "Aborting on unreadable result file"
                    );

                    return Err(error.into());
                }
            },
        }
    }

    let mut connection = Connection::load(&args.db_file)?;
    connection.init()?;
    let run = connection.store_ingestion(&Ingestion {
        commit_sha: &args.commit_sha,
        branch: &args.branch,
        metric_category: &config.metric_category,
        measurements: &measurements,
    })?;
    connection.close()?;

    println!(
        "Benchmarks stored for commit {} on branch {}.",
        args.commit_sha, args.branch
    );
    if skipped > 0 {
        println!("Skipped {skipped} unreadable result file(s).");
    }

    Ok(IngestSummary {
        run,
        files,
        skipped,
        unsupported,
        stored: measurements.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn args(dir: &Path, commit: &str) -> StoreArgs {
        StoreArgs {
            results_dir: dir.join("results"),
            db_file: dir.join("benchmarks.db"),
            commit_sha: commit.to_owned(),
            branch: "main".to_owned(),
        }
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join("results").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn stored(args: &StoreArgs) -> (usize, usize) {
        let mut connection = Connection::load(&args.db_file).unwrap();
        connection.init().unwrap();

        (
            connection.load_benchmarks().unwrap().len(),
            connection.load_runs().unwrap().len(),
        )
    }

    #[test]
    fn two_files_two_rows_one_run() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"{"benchmarks":[{"name":"a","mean":{"point_estimate":10.0}}]}"#,
        );
        write(
            dir.path(),
            "nested/b.json",
            r#"[{"name":"b","mean":{"point_estimate":20.0}}]"#,
        );
        let args = args(dir.path(), "C1");

        let summary = run(&args, &IngestConfig::default()).unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(summary.stored, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(stored(&args), (2, 1));

        let mut connection = Connection::load(&args.db_file).unwrap();
        connection.init().unwrap();
        let records = connection.load_benchmarks().unwrap();
        assert!(records
            .iter()
            .all(|record| record.commit_sha == "C1" && record.branch == "main"));
        assert_eq!(
            records
                .iter()
                .map(|record| (record.metric_name.as_str(), record.value))
                .collect::<Vec<_>>(),
            vec![("a", 10.0), ("b", 20.0)]
        );
    }

    #[test]
    fn no_entries_still_records_a_run() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "empty.json", "[]");
        write(dir.path(), "no-mean.json", r#"[{"name":"a"}]"#);
        let args = args(dir.path(), "C1");

        let summary = run(&args, &IngestConfig::default()).unwrap();

        assert_eq!(summary.stored, 0);
        assert_eq!(stored(&args), (0, 1));
    }

    #[test]
    fn each_ingestion_adds_one_run() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"[{"name":"a","mean":{"point_estimate":1.0}},{"name":"b","mean":{"point_estimate":2.0}}]"#,
        );

        run(&args(dir.path(), "C1"), &IngestConfig::default()).unwrap();
        run(&args(dir.path(), "C2"), &IngestConfig::default()).unwrap();

        assert_eq!(stored(&args(dir.path(), "C2")), (4, 2));
    }

    #[test]
    fn broken_and_unsupported_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "good.json",
            r#"[{"name":"a","mean":{"point_estimate":1.0}}]"#,
        );
        write(dir.path(), "broken.json", "{ not json");
        write(dir.path(), "estimates.json", r#"{"mean":{"point_estimate":1.0}}"#);
        write(dir.path(), "readme.txt", "not a result");
        let args = args(dir.path(), "C1");

        let summary = run(&args, &IngestConfig::default()).unwrap();

        assert_eq!(
            summary,
            IngestSummary {
                run: summary.run,
                files: 3,
                skipped: 1,
                unsupported: 1,
                stored: 1,
            }
        );
        assert_eq!(stored(&args), (1, 1));
    }

    #[test]
    fn abort_policy_stops_without_writing() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"[{"name":"a","mean":{"point_estimate":1.0}}]"#,
        );
        write(dir.path(), "b.json", "{ not json");
        let args = args(dir.path(), "C1");
        let config = IngestConfig {
            on_error: OnError::Abort,
            ..IngestConfig::default()
        };

        let result = run(&args, &config);

        assert!(matches!(result, Err(CommandError::Ingest(_))));
        assert_eq!(stored(&args), (0, 0));
    }

    #[test]
    fn configured_category_is_stored() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"[{"name":"a","mean":{"point_estimate":1.0}}]"#,
        );
        let args = args(dir.path(), "C1");
        let config = IngestConfig {
            metric_category: "iai".to_owned(),
            ..IngestConfig::default()
        };

        run(&args, &config).unwrap();

        let mut connection = Connection::load(&args.db_file).unwrap();
        connection.init().unwrap();
        assert_eq!(
            connection.load_benchmarks().unwrap()[0].metric_category,
            "iai"
        );
    }

    #[test]
    fn missing_results_directory_is_fatal() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            run(&args(dir.path(), "C1"), &IngestConfig::default()),
            Err(CommandError::Ingest(_))
        ));
    }
}
