use benchwatch_analysis::{regression::ThresholdError, ChartOptions, Threshold};
use benchwatch_ingest::collector::{compile_glob, DEFAULT_GLOB};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Config file {} not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to read config file")]
    Read(#[from] io::Error),
    #[error("Failed to deserialize config file")]
    Deserialize(#[from] serde_yaml::Error),
    #[error("Invalid regression threshold")]
    InvalidThreshold(#[from] ThresholdError),
    #[error("Config contains {0} error(s), see log for details")]
    Preflight(usize),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub check: CheckConfig,
    #[serde(default)]
    pub visualize: VisualizeConfig,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// what to do with a result file that can't be read or parsed
pub enum OnError {
    #[default]
    Skip,
    Abort,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    // matched against paths relative to the results directory
    #[serde(default = "default_glob")]
    pub glob: String,
    #[serde(default = "default_metric_category")]
    pub metric_category: String,
    #[serde(default)]
    pub on_error: OnError,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    // percentage, the command line flag takes precedence
    pub threshold: Option<f64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VisualizeConfig {
    #[serde(default = "default_trends_file")]
    pub trends_file: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_trend_width")]
    pub trend_width: u32,
    #[serde(default = "default_trend_height")]
    pub trend_height: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            glob: default_glob(),
            metric_category: default_metric_category(),
            on_error: OnError::default(),
        }
    }
}

impl Default for VisualizeConfig {
    fn default() -> Self {
        Self {
            trends_file: default_trends_file(),
            width: default_width(),
            height: default_height(),
            trend_width: default_trend_width(),
            trend_height: default_trend_height(),
        }
    }
}

impl From<&VisualizeConfig> for ChartOptions {
    fn from(config: &VisualizeConfig) -> Self {
        ChartOptions {
            trends_file: config.trends_file.clone(),
            width: config.width,
            height: config.height,
            trend_width: config.trend_width,
            trend_height: config.trend_height,
        }
    }
}

impl RunnerConfig {
    /// load the config file if one was given, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigErrors> {
        let Some(path) = path else {
            debug!("No config file given, using defaults");

            return Ok(Self::default());
        };

        if !path.is_file() {
            return Err(ConfigErrors::FileNotFound(path.to_path_buf()));
        }

        let config: Self = serde_yaml::from_str(&fs::read_to_string(path)?)?;
        debug!(path = ?path, config = ?config, "Loaded config");

        Ok(config)
    }

    /// effective threshold, an explicit flag wins over the config file
    pub fn threshold(&self, flag: Option<Threshold>) -> Result<Threshold, ConfigErrors> {
        match (flag, self.check.threshold) {
            (Some(threshold), _) => Ok(threshold),
            (None, Some(percentage)) => Ok(Threshold::new(percentage)?),
            (None, None) => Ok(Threshold::default()),
        }
    }

    /// Validate the whole config and log every problem before failing
    pub fn preflight_checks(&self) -> Result<(), ConfigErrors> {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut errors = 0;

        if let Err(error) = compile_glob(&self.ingest.glob) {
            error!("ingest.glob '{}' is not a valid glob: {error}", self.ingest.glob);
            errors += 1;
        }

        if self.ingest.metric_category.trim().is_empty() {
            error!("ingest.metric_category must not be empty");
            errors += 1;
        }

        if let Some(percentage) = self.check.threshold {
            if let Err(error) = Threshold::new(percentage) {
                error!("check.threshold is invalid: {error}");
                errors += 1;
            }
        }

        let trends_file = Path::new(&self.visualize.trends_file);
        if trends_file.file_name() != Some(trends_file.as_os_str()) {
            error!(
                "visualize.trends_file '{}' must be a plain file name",
                self.visualize.trends_file
            );
            errors += 1;
        }

        for (name, value) in [
            ("width", self.visualize.width),
            ("height", self.visualize.height),
            ("trend_width", self.visualize.trend_width),
            ("trend_height", self.visualize.trend_height),
        ] {
            if value == 0 {
                error!("visualize.{name} must be greater than 0");
                errors += 1;
            }
        }

        if errors == 0 {
            Ok(())
        } else {
            Err(ConfigErrors::Preflight(errors))
        }
    }
}

fn default_glob() -> String {
    DEFAULT_GLOB.to_owned()
}

fn default_metric_category() -> String {
    "criterion".to_owned()
}

fn default_trends_file() -> String {
    ChartOptions::default().trends_file
}

fn default_width() -> u32 {
    ChartOptions::default().width
}

fn default_height() -> u32 {
    ChartOptions::default().height
}

fn default_trend_width() -> u32 {
    ChartOptions::default().trend_width
}

fn default_trend_height() -> u32 {
    ChartOptions::default().trend_height
}
