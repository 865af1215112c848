use super::CommandError;
use crate::{config::VisualizeConfig, database::Connection};
use benchwatch_analysis::{ChartOptions, Visualizer};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct VisualizeArgs {
    /// SQLite database file
    #[arg(long)]
    pub db_file: PathBuf,

    /// Directory for the generated charts, created if missing
    #[arg(long)]
    pub output_dir: PathBuf,
}

/// Render every stored record, returns the written files
pub fn run(args: &VisualizeArgs, config: &VisualizeConfig) -> Result<Vec<PathBuf>, CommandError> {
    let mut connection = Connection::load(&args.db_file)?;
    connection.init()?;
    let records = connection.load_benchmarks()?;
    connection.close()?;

    let written =
        Visualizer::new(ChartOptions::from(config)).render(&records, &args.output_dir)?;

    if records.is_empty() {
        println!("No benchmark data found.");
    } else {
        println!("Visualizations saved to {}", args.output_dir.display());
    }

    Ok(written)
}
