use crate::{
    config::ComparisonConfig,
    report::{Artifact, Report, ReportWriter},
};
use std::{fs, path::PathBuf};
use thiserror::Error;
use tmp_analysis::{compare, summarize_all, BaselineSelector, Comparison, DatabaseSummary};
use tmp_ingest::MetricStore;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No metric files found or loaded in {0:?}")]
    EmptyCorpus(PathBuf),
    #[error("Failed to create report directory {path:?}")]
    ReportDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of a finished run
#[derive(Debug)]
pub struct RunSummary {
    pub summaries: Vec<DatabaseSummary>,
    pub comparison: Comparison,
    pub artifacts: Vec<Artifact>,
}

/// load -> summarize -> compare -> render
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub metrics_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub selector: BaselineSelector,
}

impl Pipeline {
    pub fn new(metrics_dir: PathBuf, reports_dir: PathBuf, selector: BaselineSelector) -> Self {
        Self {
            metrics_dir,
            reports_dir,
            selector,
        }
    }

    pub fn from_config(config: &ComparisonConfig) -> Self {
        Self::new(config.metrics_dir(), config.reports_dir(), config.selector())
    }

    #[instrument(skip(self), level = "info")]
    pub fn run(&self, generated: &str) -> Result<RunSummary, PipelineError> {
        fs::create_dir_all(&self.reports_dir).map_err(|source| PipelineError::ReportDirectory {
            path: self.reports_dir.clone(),
            source,
        })?;

        let store = MetricStore::scan(&self.metrics_dir);
        if store.is_empty() {
            return Err(PipelineError::EmptyCorpus(self.metrics_dir.clone()));
        }

        let summaries = summarize_all(&store);
        let comparison = compare(&store, &self.selector);

        let report = Report {
            summaries: &summaries,
            comparison: &comparison,
            skipped: store.skipped().iter().map(|file| file.path.clone()).collect(),
        };
        let artifacts = ReportWriter::new(&self.reports_dir).write_all(&report, generated);

        info!(
            databases = summaries.len(),
            records = comparison.records().len(),
            "Finished comparison"
        );

        Ok(RunSummary {
            summaries,
            comparison,
            artifacts,
        })
    }
}
