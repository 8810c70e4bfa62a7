use crate::{baseline::BaselineSelector, round2};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use tmp_ingest::{as_f64, as_text, MetricKind, MetricStore, Record};
use tracing::{debug, error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    /// anything but an exact `Success` counts as a failed run
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("Success") => Self::Success,
            _ => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
        }
    }
}

/// One benchmark run of a query against a database, plus the derived comparison columns
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceRecord {
    pub database: String,
    pub schema: Option<String>,
    pub category: Option<String>,
    pub query_id: Option<String>,
    pub query_name: Option<String>,
    pub sql_query: Option<String>,
    pub latency_ms: Option<f64>,
    pub status: Status,
    pub error_message: Option<String>,
    pub baseline_latency_ms: Option<f64>,
    pub schema_efficiency_factor: Option<f64>,
    pub performance_improvement_factor: Option<f64>,
}

impl PerformanceRecord {
    pub const COLUMNS: [&'static str; 9] = [
        "database",
        "schema",
        "category",
        "query_id",
        "query_name",
        "sql_query",
        "latency_ms",
        "status",
        "error_message",
    ];

    pub const DERIVED_COLUMNS: [&'static str; 3] = [
        "baseline_latency_ms",
        "schema_efficiency_factor",
        "performance_improvement_factor",
    ];

    /// Build a record from a raw benchmark row. The owning database always comes
    /// from the file name, never from the row.
    pub fn from_row(database: &str, row: &Record) -> Self {
        let text = |column: &str| row.get(column).and_then(as_text);

        Self {
            database: database.to_owned(),
            schema: text("schema"),
            category: text("category"),
            query_id: text("query_id"),
            query_name: text("query_name"),
            sql_query: text("sql_query"),
            latency_ms: row.get("latency_ms").and_then(as_f64),
            status: Status::parse(text("status").as_deref()),
            error_message: text("error_message"),
            baseline_latency_ms: None,
            schema_efficiency_factor: None,
            performance_improvement_factor: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Fill in the derived columns against `baseline`.
    /// Ratios that are not finite (zero divisors) stay empty.
    fn derive(&mut self, baseline: Option<f64>, in_cohort: bool) {
        self.baseline_latency_ms = baseline;

        if let (Some(latency), Some(baseline)) = (self.latency_ms, baseline) {
            self.schema_efficiency_factor = finite(latency / baseline).map(round2);
            self.performance_improvement_factor =
                finite((latency - baseline) / latency * 100.0).map(round2);
        }

        if in_cohort {
            self.performance_improvement_factor = Some(0.0);
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    Some(value).filter(|value| value.is_finite())
}

/// Result of the cross-database comparison
#[derive(Clone, Debug, PartialEq)]
pub enum Comparison {
    /// no benchmark rows, or none of them succeeded
    Empty,
    /// benchmark rows exist but no baseline cohort could be identified
    Undecorated(Vec<PerformanceRecord>),
    /// successful rows with derived columns
    Compared {
        records: Vec<PerformanceRecord>,
        baseline: BTreeSet<String>,
    },
}

impl Comparison {
    pub fn records(&self) -> &[PerformanceRecord] {
        match self {
            Self::Empty => &[],
            Self::Undecorated(records) | Self::Compared { records, .. } => records,
        }
    }

    pub fn is_compared(&self) -> bool {
        matches!(self, Self::Compared { .. })
    }

    pub fn baseline(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Compared { baseline, .. } => Some(baseline),
            Self::Empty | Self::Undecorated(_) => None,
        }
    }
}

/// Merge the benchmark tables of every database and derive efficiency against
/// the fastest baseline run of each query.
pub fn compare(store: &MetricStore, selector: &BaselineSelector) -> Comparison {
    info!("Calculating comparative performance metrics");

    let mut found = false;
    let mut records = Vec::new();

    for (database, metrics) in store.databases() {
        match metrics.get(&MetricKind::PerformanceBenchmarks) {
            Some(payload) => match payload.as_table() {
                Some(table) => {
                    found = true;
                    records.extend(
                        table
                            .rows
                            .iter()
                            .map(|row| PerformanceRecord::from_row(database, row)),
                    );
                }
                None => warn!(
                    database = database.as_str(),
                    "Performance benchmarks are not tabular, ignoring them"
                ),
            },
            None => debug!(database = database.as_str(), "No performance benchmarks"),
        }
    }

    if !found {
        warn!("No performance benchmark data found to compare");

        return Comparison::Empty;
    }

    let successful = records.iter().filter(|record| record.is_success()).count();
    if successful == 0 {
        warn!(
            rows = records.len(),
            "Performance data is empty or contains no successful queries"
        );

        return Comparison::Empty;
    }

    let candidates: BTreeSet<String> = records
        .iter()
        .filter(|record| record.is_success())
        .map(|record| record.database.clone())
        .collect();
    let baseline = selector.resolve(&candidates);

    if baseline.is_empty() {
        error!("No benchmark/denormalized databases found for comparison base");

        return Comparison::Undecorated(records);
    }

    let mut records = records
        .into_iter()
        .filter(PerformanceRecord::is_success)
        .collect_vec();

    let fastest: BTreeMap<String, f64> = records
        .iter()
        .filter(|record| baseline.contains(&record.database))
        .filter_map(|record| Some((record.query_id.clone()?, record.latency_ms?)))
        .into_grouping_map()
        .fold_first(|fastest, _, latency| fastest.min(latency))
        .into_iter()
        .collect();

    for record in records.iter_mut() {
        let reference = record
            .query_id
            .as_ref()
            .and_then(|query_id| fastest.get(query_id))
            .copied();
        let in_cohort = baseline.contains(&record.database);

        record.derive(reference, in_cohort);
    }

    info!(
        rows = records.len(),
        queries = fastest.len(),
        "Calculated comparative performance metrics"
    );

    Comparison::Compared { records, baseline }
}
