use itertools::Itertools;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Closed vocabulary of metric kinds written by the profiling pipeline
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    BasicMetrics,
    SchemaCounts,
    TableMetrics,
    ColumnStructure,
    ColumnProfiles,
    InteropMetrics,
    PerformanceBenchmarks,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        Self::BasicMetrics,
        Self::SchemaCounts,
        Self::TableMetrics,
        Self::ColumnStructure,
        Self::ColumnProfiles,
        Self::InteropMetrics,
        Self::PerformanceBenchmarks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicMetrics => "basic_metrics",
            Self::SchemaCounts => "schema_counts",
            Self::TableMetrics => "table_metrics",
            Self::ColumnStructure => "column_structure",
            Self::ColumnProfiles => "column_profiles",
            Self::InteropMetrics => "interop_metrics",
            Self::PerformanceBenchmarks => "performance_benchmarks",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("unknown metric kind '{value}'"))
    }
}

/// suffixes in matching order, longest first so no shorter kind can shadow a longer one
pub static SUFFIXES: Lazy<Vec<(MetricKind, String)>> = Lazy::new(|| {
    MetricKind::ALL
        .into_iter()
        .sorted_by(|a, b| {
            b.as_str()
                .len()
                .cmp(&a.as_str().len())
                .then_with(|| a.as_str().cmp(b.as_str()))
        })
        .map(|kind| (kind, format!("_{}", kind.as_str())))
        .collect_vec()
});

/// The `(database, kind)` pair encoded in a metric file name
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricId {
    pub database: String,
    pub kind: MetricKind,
}

impl MetricId {
    pub fn new(database: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            database: database.into(),
            kind,
        }
    }

    /// Split a file stem such as `tmp_df9_table_metrics` into its database and kind.
    ///
    /// Only an exact `_<kind>` suffix counts, and the remaining prefix must not be
    /// empty. Returns `None` for stems outside the vocabulary.
    pub fn parse(stem: &str) -> Option<Self> {
        SUFFIXES.iter().find_map(|(kind, suffix)| {
            stem.strip_suffix(suffix.as_str())
                .filter(|database| !database.is_empty())
                .map(|database| Self::new(database, *kind))
        })
    }

    /// file stem used when writing this metric back to disk
    pub fn stem(&self) -> String {
        format!("{}_{}", self.database, self.kind)
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.database, self.kind)
    }
}
