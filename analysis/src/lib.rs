//! Summary and cross-database performance analysis over a loaded
//! [`tmp_ingest::MetricStore`].

pub mod baseline;
pub mod performance;
pub mod pivot;
pub mod summary;

#[cfg(test)]
mod baseline_test;
#[cfg(test)]
mod performance_test;
#[cfg(test)]
mod summary_test;

pub use baseline::{BaselineSelector, DEFAULT_BASELINE_PATTERN};
pub use performance::{compare, Comparison, PerformanceRecord, Status};
pub use pivot::{efficiency_pivot, latency_pivot, Pivot, PivotRow};
pub use summary::{summarize, summarize_all, DatabaseSummary, Measure, SummaryField};

/// Round to two decimals, ties to even on the scaled value
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
