mod config;
mod logging;
mod pipeline;
mod report;


use crate::{
    config::{ComparisonConfig, ConfigErrors, DEFAULT_CONFIG_PATH, DEFAULT_LOG_LEVEL},
    logging::RunLogger,
    pipeline::{Pipeline, PipelineError},
    report::ArtifactStatus,
};
use clap::Parser;
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{error, info, warn};

/// Aggregate and compare database profiling results
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn load_config(path: &Path) -> Result<ComparisonConfig, ConfigErrors> {
    info!(path = ?path, "Reading configuration");

    let config = ComparisonConfig::load(path)?;

    if config.preflight_checks() {
        return Err(ConfigErrors::Preflight);
    }

    Ok(config)
}

fn run(config: &ComparisonConfig) -> Result<(), PipelineError> {
    info!("--- Starting comparison and aggregation ---");

    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let outcome = Pipeline::from_config(config).run(&generated)?;

    for artifact in outcome.artifacts.iter() {
        if let ArtifactStatus::Failed(ref reason) = artifact.status {
            warn!(path = ?artifact.path, reason = reason.as_str(), "Report artifact is missing");
        }
    }

    info!(
        databases = outcome.summaries.len(),
        "--- Comparison and aggregation finished ---"
    );

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let console = match RunLogger::console(DEFAULT_LOG_LEVEL) {
        Ok(logger) => logger,
        Err(logging_error) => {
            eprintln!("Failed to set up logging: {logging_error}");

            return ExitCode::FAILURE;
        }
    };

    let config = match console.in_scope(|| load_config(&args.config)) {
        Ok(config) => config,
        Err(config_error) => {
            console.in_scope(|| error!(error = %config_error, "Configuration error, halting"));

            return ExitCode::FAILURE;
        }
    };

    let logger = match RunLogger::for_run(&config.logging, &config.log_file()) {
        Ok(logger) => logger,
        Err(logging_error) => {
            console.in_scope(|| error!(error = %logging_error, "Failed to set up run logging"));

            return ExitCode::FAILURE;
        }
    };

    logger.in_scope(|| {
        info!(log_file = ?logger.file(), "Logging to file");

        match run(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(pipeline_error) => {
                error!(error = %pipeline_error, "Halting execution");

                ExitCode::FAILURE
            }
        }
    })
}
