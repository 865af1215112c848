mod commands;
mod config;
mod database;

use clap::{Parser, Subcommand};
use commands::{
    check::CheckArgs, error_chain, store::StoreArgs, visualize::VisualizeArgs, CommandError,
};
use config::RunnerConfig;
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "benchwatch")]
#[command(about = "Store benchmark results, check for regressions and chart trends", long_about = None)]
struct Cli {
    /// Optional YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store Criterion JSON results in the database as one run
    Store(StoreArgs),
    /// Compare a commit against a baseline branch, exits with 1 on regression
    Check(CheckArgs),
    /// Render an interactive trend chart and one trend image per metric
    Visualize(VisualizeArgs),
}

const REGRESSION_EXIT: u8 = 1;
const FAILURE_EXIT: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            report(&error);

            ExitCode::from(FAILURE_EXIT)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CommandError> {
    let config = RunnerConfig::load(cli.config.as_deref())?;
    config.preflight_checks()?;

    match cli.command {
        Command::Store(args) => {
            let summary = commands::store::run(&args, &config.ingest)?;
            info!(
                run = summary.run,
                files = summary.files,
                stored = summary.stored,
                skipped = summary.skipped,
                unsupported = summary.unsupported,
                "Finished ingestion"
            );

            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => {
            if commands::check::run(&args, &config)?.passed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(REGRESSION_EXIT))
            }
        }
        Command::Visualize(args) => {
            commands::visualize::run(&args, &config.visualize)?;

            Ok(ExitCode::SUCCESS)
        }
    }
}

/// log the error together with its whole source chain
fn report(error: &CommandError) {
    error!("{}", error_chain(error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_defaults_to_config_threshold() {
        let cli = Cli::parse_from([
            "benchwatch",
            "check",
            "--db-file",
            "bench.db",
            "--current-commit",
            "abc",
            "--baseline-branch",
            "main",
        ]);

        match cli.command {
            Command::Check(args) => {
                assert!(args.threshold_percentage.is_none());
                assert_eq!(args.current_commit, "abc");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        let result = Cli::try_parse_from([
            "benchwatch",
            "store",
            "--results-dir",
            "results",
            "--db-file",
            "bench.db",
            "--commit-sha",
            "",
            "--branch",
            "main",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let result = Cli::try_parse_from([
            "benchwatch",
            "check",
            "--db-file",
            "bench.db",
            "--current-commit",
            "abc",
            "--baseline-branch",
            "main",
            "--threshold-percentage",
            "-5",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn config_is_global() {
        let cli = Cli::parse_from([
            "benchwatch",
            "visualize",
            "--db-file",
            "bench.db",
            "--output-dir",
            "out",
            "--config",
            "benchwatch.yaml",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("benchwatch.yaml")));
    }
}
