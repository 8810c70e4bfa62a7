use crate::{payload::Format, LoadError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Finds metric files directly inside one directory
#[derive(Debug)]
pub struct Collector {
    root: PathBuf,
    matcher: GlobSet,
}

impl Collector {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let mut builder = GlobSetBuilder::new();

        for format in [Format::Csv, Format::Json] {
            builder.add(Glob::new(&format!("*.{}", format.extension()))?);
        }

        Ok(Self {
            root: root.into(),
            matcher: builder.build()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All matching files, CSV files first and each group sorted by name.
    /// Symlinks are followed and count as the file they point to.
    /// Later files win when a metric exists in both formats.
    pub fn collect(&self) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .follow_links(true)
            .max_depth(Some(1));

        builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(error = %error, "Failed to read entry while scanning for metric files");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|kind| kind.is_file()))
            .map(DirEntry::into_path)
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| self.matcher.is_match(Path::new(name)))
            })
            .sorted_by_key(|path| {
                let rank = match path.extension().and_then(|extension| extension.to_str()) {
                    Some("csv") => 0,
                    _ => 1,
                };

                (rank, path.clone())
            })
            .inspect(|path| debug!(path = ?path, "Found metric file"))
            .collect_vec()
    }
}
