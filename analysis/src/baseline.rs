use itertools::Itertools;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// substring that marks the denormalized benchmark databases by convention
pub const DEFAULT_BASELINE_PATTERN: &str = "benchmark";

/// Decides which databases form the reference cohort for relative comparison.
///
/// An explicit list always wins. The pattern is only used to infer the cohort
/// when no list is configured, and to flag disagreement when one is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaselineSelector {
    pub databases: Vec<String>,
    pub pattern: String,
}

impl Default for BaselineSelector {
    fn default() -> Self {
        Self {
            databases: Vec::new(),
            pattern: DEFAULT_BASELINE_PATTERN.to_owned(),
        }
    }
}

impl BaselineSelector {
    pub fn explicit<I, S>(databases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            databases: databases.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            databases: Vec::new(),
            pattern: pattern.into(),
        }
    }

    fn matching(&self, candidates: &BTreeSet<String>) -> BTreeSet<String> {
        candidates
            .iter()
            .filter(|name| name.contains(self.pattern.as_str()))
            .cloned()
            .collect()
    }

    /// Resolve the cohort among `candidates`, the databases with successful runs
    pub fn resolve(&self, candidates: &BTreeSet<String>) -> BTreeSet<String> {
        let inferred = self.matching(candidates);

        if self.databases.is_empty() {
            info!(
                pattern = self.pattern.as_str(),
                cohort = ?inferred,
                "Inferred baseline cohort from database names"
            );

            return inferred;
        }

        let (present, absent): (Vec<_>, Vec<_>) = self
            .databases
            .iter()
            .cloned()
            .partition(|name| candidates.contains(name));

        if !absent.is_empty() {
            warn!(
                databases = ?absent,
                "Configured baseline databases have no successful benchmark runs"
            );
        }

        let explicit: BTreeSet<String> = present.into_iter().collect();

        if !inferred.is_empty() && inferred != explicit {
            warn!(
                configured = ?explicit,
                by_pattern = ?inferred,
                pattern = self.pattern.as_str(),
                "Configured baseline cohort disagrees with the naming convention, using the configured one"
            );
        }

        info!(cohort = ?explicit.iter().collect_vec(), "Using configured baseline cohort");

        explicit
    }
}
