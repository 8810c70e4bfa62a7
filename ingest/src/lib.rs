//! Discovery and decoding of the per-database metric files written by the
//! profiling pipeline.

pub mod collector;
pub mod kind;
pub mod payload;
pub mod store;


pub use kind::{MetricId, MetricKind};
pub use payload::{as_f64, as_i64, as_text, Format, MetricPayload, Record, Table};
pub use store::{DatabaseMetrics, MetricStore, SkippedFile};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read metric file")]
    Io(#[from] std::io::Error),
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV file has no header row")]
    EmptyCsv,
    #[error("CSV row on line {line} has {fields} fields, the header only {expected}")]
    RaggedRow {
        line: u64,
        fields: usize,
        expected: usize,
    },
    #[error("Invalid discovery pattern")]
    Glob(#[from] globset::Error),
    #[error("File name {0:?} does not end with a known metric kind")]
    UnrecognisedName(PathBuf),
    #[error("Unsupported file extension for {0:?}")]
    UnsupportedExtension(PathBuf),
    #[error("JSON metric must be an object or an array of objects, found {0}")]
    UnsupportedJson(&'static str),
}
