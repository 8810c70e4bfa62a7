use crate::config::LoggingConfig;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tracing::{dispatcher, Dispatch};
use tracing_subscriber::{fmt::writer::MakeWriterExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to open log file {path:?}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Logging context of a single run.
///
/// Owns its own subscriber and only installs it while [`RunLogger::in_scope`]
/// executes, so concurrent runs (and tests) never share log state.
#[derive(Clone)]
pub struct RunLogger {
    dispatch: Dispatch,
    file: Option<PathBuf>,
}

impl RunLogger {
    fn filter(level: &str) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => Ok(EnvFilter::try_new(level)?),
        }
    }

    /// stdout only, used before the configuration is known
    pub fn console(level: &str) -> Result<Self, LoggingError> {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(Self::filter(level)?)
            .finish();

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            file: None,
        })
    }

    /// stdout plus a log file that is truncated for every run
    pub fn for_run(config: &LoggingConfig, path: &Path) -> Result<Self, LoggingError> {
        let file_error = |source| LoggingError::File {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(file_error)?;
        }

        let file = Arc::new(File::create(path).map_err(file_error)?);
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(Self::filter(&config.level)?)
            .with_ansi(false)
            .with_writer(std::io::stdout.and(file))
            .finish();

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            file: Some(path.to_path_buf()),
        })
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn in_scope<T>(&self, work: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, work)
    }
}
