use super::CommandError;
use crate::{config::RunnerConfig, database::Connection};
use benchwatch_analysis::{regression, Report, Threshold};
use clap::{builder::NonEmptyStringValueParser, Args};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// SQLite database file
    #[arg(long)]
    pub db_file: PathBuf,

    /// Commit SHA whose results are checked
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub current_commit: String,

    /// Branch providing the baseline results
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    pub baseline_branch: String,

    /// Allowed slowdown in percent [default: 5.0, or check.threshold from the config]
    #[arg(long)]
    pub threshold_percentage: Option<Threshold>,
}

/// Compare the current commit against the baseline branch and report regressions
///
/// Missing data is reported as `Report::NoData`, which counts as passing.
pub fn run(args: &CheckArgs, config: &RunnerConfig) -> Result<Report, CommandError> {
    let threshold = config.threshold(args.threshold_percentage)?;

    let mut connection = Connection::load(&args.db_file)?;
    connection.init()?;
    let records = connection.load_benchmarks()?;
    let runs = connection.load_runs()?;
    connection.close()?;
    debug!(
        records = records.len(),
        runs = runs.len(),
        "Loaded benchmark data"
    );

    if records.is_empty() {
        println!("No benchmark data found.");

        return Ok(Report::NoData);
    }

    let report = regression::check(
        &records,
        &args.current_commit,
        &args.baseline_branch,
        threshold,
    );

    match &report {
        Report::NoData => println!("No data for current commit or baseline branch."),
        Report::Compared {
            comparisons,
            skipped,
        } => {
            for metric in skipped {
                warn!(metric = %metric, "No baseline for metric, not compared");
            }

            for regression in report.regressions() {
                println!("Regression detected in {regression}");
            }

            if report.passed() {
                println!("No regressions detected.");
            }

            info!(
                compared = comparisons.len(),
                regressions = report.regressions().count(),
                threshold = threshold.percentage(),
                "Finished regression check"
            );
        }
    }

    Ok(report)
}
