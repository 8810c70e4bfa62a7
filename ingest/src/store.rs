use crate::{
    collector::Collector,
    kind::{MetricId, MetricKind},
    payload::MetricPayload,
    LoadError,
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

/// metric kind -> payload for a single database
pub type DatabaseMetrics = BTreeMap<MetricKind, MetricPayload>;

/// A file that contributed nothing to the store, together with the reason
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: LoadError,
}

/// database name -> metric kind -> payload
#[derive(Debug, Default)]
pub struct MetricStore {
    databases: BTreeMap<String, DatabaseMetrics>,
    skipped: Vec<SkippedFile>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every recognised metric file in `dir`.
    ///
    /// Never fails: a missing directory yields an empty store and every file that
    /// cannot be named or decoded is logged and recorded in [`MetricStore::skipped`].
    pub fn scan(dir: &Path) -> Self {
        let mut store = Self::new();

        info!(path = ?dir, "Scanning for metric files");

        if !dir.is_dir() {
            error!(path = ?dir, "Input metrics directory not found");

            return store;
        }

        let files = match Collector::new(dir) {
            Ok(collector) => collector.collect(),
            Err(error) => {
                error!(error = %error, "Failed to prepare metric file discovery");

                return store;
            }
        };

        info!("Found {} metric files to process", files.len());

        for path in files {
            if let Err(reason) = store.load_file(&path) {
                match &reason {
                    LoadError::UnrecognisedName(_) => {
                        warn!(path = ?path, "Could not determine database name, skipping")
                    }
                    other => {
                        error!(path = ?path, error = %other, "Failed to load or parse metric file")
                    }
                }

                store.skipped.push(SkippedFile { path, reason });
            }
        }

        info!(
            databases = store.databases.len(),
            skipped = store.skipped.len(),
            "Finished loading metric files"
        );

        store
    }

    fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let id = MetricId::parse(stem)
            .ok_or_else(|| LoadError::UnrecognisedName(path.to_path_buf()))?;
        let payload = MetricPayload::load(path)?;

        self.insert(id, payload);

        Ok(())
    }

    /// insert or replace a single metric
    pub fn insert(&mut self, id: MetricId, payload: MetricPayload) {
        self.databases
            .entry(id.database)
            .or_default()
            .insert(id.kind, payload);
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn get(&self, database: &str) -> Option<&DatabaseMetrics> {
        self.databases.get(database)
    }

    pub fn metric(&self, database: &str, kind: MetricKind) -> Option<&MetricPayload> {
        self.get(database).and_then(|metrics| metrics.get(&kind))
    }

    /// databases in name order
    pub fn databases(&self) -> impl Iterator<Item = (&String, &DatabaseMetrics)> {
        self.databases.iter()
    }

    pub fn database_names(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Write every metric back as `<database>_<kind>.<ext>` into `dir`
    pub fn save(&self, dir: &Path) -> Result<(), LoadError> {
        for (database, metrics) in self.databases.iter() {
            for (kind, payload) in metrics.iter() {
                let path = dir.join(format!(
                    "{}.{}",
                    MetricId::new(database.as_str(), *kind).stem(),
                    payload.format().extension()
                ));

                payload.save(&path)?;
            }
        }

        Ok(())
    }
}
