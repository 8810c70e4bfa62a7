use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Error,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tmp_analysis::{BaselineSelector, DEFAULT_BASELINE_PATTERN};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const LOG_FILE_NAME: &str = "run_comparison.log";

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Configuration file not found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("Failed to read configuration file")]
    Unreadable(#[from] Error),
    #[error("Configuration is malformed or misses a required section or option: {0}")]
    Malformed(#[from] serde_yaml::Error),
    #[error("Configuration failed the preflight checks")]
    Preflight,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct ComparisonConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    // directory the profiling pipeline wrote its metric files to
    pub output_metrics: PathBuf,
    // directory for the generated reports, created on demand
    pub output_reports: PathBuf,
    // base for relative paths, defaults to the directory of the config file
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct BaselineConfig {
    // explicit reference cohort, takes precedence over `pattern`
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default = "default_baseline_pattern")]
    pub pattern: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    // EnvFilter directive, RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            databases: Vec::new(),
            pattern: default_baseline_pattern(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl ComparisonConfig {
    /// Read and parse the configuration, anchoring relative paths at the config file
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        if !path.is_file() {
            return Err(ConfigErrors::FileNotFound(path.to_path_buf()));
        }

        let mut config = Self::parse(&fs::read_to_string(path)?)?;

        if config.paths.root.is_none() {
            config.paths.root = Some(
                path.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            );
        }

        Ok(config)
    }

    pub fn parse(input: &str) -> Result<Self, ConfigErrors> {
        Ok(serde_yaml::from_str(input)?)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.paths.root {
            Some(ref root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn metrics_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output_metrics)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output_reports)
    }

    /// log file of the run, inside the reports directory unless configured otherwise
    pub fn log_file(&self) -> PathBuf {
        match self.logging.file {
            Some(ref file) => self.resolve(file),
            None => self.reports_dir().join(LOG_FILE_NAME),
        }
    }

    pub fn selector(&self) -> BaselineSelector {
        BaselineSelector {
            databases: self.baseline.databases.clone(),
            pattern: self.baseline.pattern.clone(),
        }
    }

    /// Validate the configuration, reporting every problem instead of the first one.
    /// Returns `true` if an error was found.
    pub fn preflight_checks(&self) -> bool {
        let mut contains_error = false;

        if self.paths.output_metrics.as_os_str().is_empty() {
            error!("paths.output_metrics must not be empty");
            contains_error = true;
        }

        if self.paths.output_reports.as_os_str().is_empty() {
            error!("paths.output_reports must not be empty");
            contains_error = true;
        }

        if !contains_error && self.metrics_dir() == self.reports_dir() {
            warn!("paths.output_metrics and paths.output_reports point to the same directory, reports will be rescanned as metric files");
        }

        if self.baseline.pattern.is_empty() {
            error!("baseline.pattern must not be empty, it would mark every database as baseline");
            contains_error = true;
        }

        for name in self.baseline.databases.iter().duplicates() {
            error!("baseline.databases lists {name:?} more than once");
            contains_error = true;
        }

        if let Some(name) = self
            .baseline
            .databases
            .iter()
            .find(|name| name.trim().is_empty())
        {
            error!("baseline.databases contains an empty name ({name:?})");
            contains_error = true;
        }

        if let Err(parse_error) = EnvFilter::try_new(&self.logging.level) {
            error!(
                "logging.level ({}) is not a valid filter: {parse_error}",
                self.logging.level
            );
            contains_error = true;
        }

        contains_error
    }
}

fn default_baseline_pattern() -> String {
    DEFAULT_BASELINE_PATTERN.to_owned()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_owned()
}
