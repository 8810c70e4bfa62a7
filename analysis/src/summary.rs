use std::fmt;
use tmp_ingest::{as_f64, as_i64, DatabaseMetrics, MetricKind, MetricStore, Record, Table};
use tracing::warn;

/// A single summary value, integers stay integers when rendered
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measure {
    Integer(i64),
    Float(f64),
}

impl Measure {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(value) => *value as f64,
            Self::Float(value) => *value,
        }
    }

    /// floats with exactly two decimals, integers unchanged
    pub fn fixed(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => format!("{value:.2}"),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Flat per-database summary. `None` means the source metric was absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatabaseSummary {
    pub database: String,
    pub size_mb: Option<f64>,
    pub table_count: Option<i64>,
    pub view_count: Option<i64>,
    pub total_estimated_rows: Option<i64>,
    pub total_index_count: Option<i64>,
    pub jdi: Option<f64>,
    pub lif: Option<f64>,
    pub nf: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryField {
    DatabaseSize,
    TableCount,
    ViewCount,
    TotalEstimatedRows,
    TotalIndexCount,
    Jdi,
    Lif,
    Nf,
}

impl SummaryField {
    pub const ALL: [SummaryField; 8] = [
        Self::DatabaseSize,
        Self::TableCount,
        Self::ViewCount,
        Self::TotalEstimatedRows,
        Self::TotalIndexCount,
        Self::Jdi,
        Self::Lif,
        Self::Nf,
    ];

    /// columns shown in the executive summary of the narrative report
    pub const EXECUTIVE: [SummaryField; 5] = [
        Self::DatabaseSize,
        Self::TableCount,
        Self::TotalEstimatedRows,
        Self::Jdi,
        Self::Nf,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::DatabaseSize => "Database Size (MB)",
            Self::TableCount => "Table Count",
            Self::ViewCount => "View Count",
            Self::TotalEstimatedRows => "Total Estimated Rows",
            Self::TotalIndexCount => "Total Index Count",
            Self::Jdi => "JDI (Join Dependency Index)",
            Self::Lif => "LIF (Logical Interop. Factor)",
            Self::Nf => "NF (Normalization Factor)",
        }
    }

    /// metric kind the field is derived from
    pub fn source(&self) -> MetricKind {
        match self {
            Self::DatabaseSize => MetricKind::BasicMetrics,
            Self::TableCount | Self::ViewCount => MetricKind::SchemaCounts,
            Self::TotalEstimatedRows | Self::TotalIndexCount => MetricKind::TableMetrics,
            Self::Jdi | Self::Lif | Self::Nf => MetricKind::InteropMetrics,
        }
    }
}

impl DatabaseSummary {
    pub const DATABASE_LABEL: &'static str = "Database";

    pub fn get(&self, field: SummaryField) -> Option<Measure> {
        match field {
            SummaryField::DatabaseSize => self.size_mb.map(Measure::Float),
            SummaryField::TableCount => self.table_count.map(Measure::Integer),
            SummaryField::ViewCount => self.view_count.map(Measure::Integer),
            SummaryField::TotalEstimatedRows => self.total_estimated_rows.map(Measure::Integer),
            SummaryField::TotalIndexCount => self.total_index_count.map(Measure::Integer),
            SummaryField::Jdi => self.jdi.map(Measure::Float),
            SummaryField::Lif => self.lif.map(Measure::Float),
            SummaryField::Nf => self.nf.map(Measure::Float),
        }
    }
}

/// Project the metrics of one database into a [`DatabaseSummary`].
///
/// Missing metrics are logged and leave their fields empty; this never fails.
pub fn summarize(database: &str, metrics: &DatabaseMetrics) -> DatabaseSummary {
    let mut summary = DatabaseSummary {
        database: database.to_owned(),
        ..Default::default()
    };

    if let Some(basic) = record(database, metrics, MetricKind::BasicMetrics) {
        summary.size_mb = basic.get("database_size_mb").and_then(as_f64);
    }

    if let Some(counts) = record(database, metrics, MetricKind::SchemaCounts) {
        summary.table_count = counts.get("table_count").and_then(as_i64);
        summary.view_count = counts.get("view_count").and_then(as_i64);
    }

    if let Some(tables) = table(database, metrics, MetricKind::TableMetrics) {
        if !tables.is_empty() {
            summary.total_estimated_rows = column_total(database, tables, "row_estimate");
            summary.total_index_count = column_total(database, tables, "index_count");
        }
    }

    if let Some(interop) = record(database, metrics, MetricKind::InteropMetrics) {
        summary.jdi = interop.get("jdi").and_then(as_f64);
        summary.lif = interop.get("lif").and_then(as_f64);
        summary.nf = interop.get("nf").and_then(as_f64);
    }

    summary
}

/// one summary per database in name order
pub fn summarize_all(store: &MetricStore) -> Vec<DatabaseSummary> {
    store
        .databases()
        .map(|(database, metrics)| summarize(database, metrics))
        .collect()
}

fn record<'a>(
    database: &str,
    metrics: &'a DatabaseMetrics,
    kind: MetricKind,
) -> Option<&'a Record> {
    match metrics.get(&kind) {
        Some(payload) => {
            let record = payload.as_record();

            if record.is_none() {
                warn!(database, metric = %kind, "Metric data is tabular, expected a single record");
            }

            record
        }
        None => {
            warn!(database, metric = %kind, "Metric data not found for database");

            None
        }
    }
}

fn table<'a>(database: &str, metrics: &'a DatabaseMetrics, kind: MetricKind) -> Option<&'a Table> {
    match metrics.get(&kind) {
        Some(payload) => {
            let table = payload.as_table();

            if table.is_none() {
                warn!(database, metric = %kind, "Metric data is a single record, expected a table");
            }

            table
        }
        None => {
            warn!(database, metric = %kind, "Metric data not found for database");

            None
        }
    }
}

fn column_total(database: &str, table: &Table, column: &str) -> Option<i64> {
    let total = table.sum(column).map(|sum| sum.trunc() as i64);

    if total.is_none() {
        warn!(database, column, "Column missing from table metrics");
    }

    total
}
