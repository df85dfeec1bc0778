//! Staging area for extraction output
//!
//! Every dataset has one fixed staging path, `{work_dir}/{dataset}.csv`,
//! written by its extraction command. Before extraction the previous file is
//! moved aside to `{dataset}.csv.stale`, so that after extraction the area
//! can tell a file produced by this run from one left over by an earlier run.

use crate::app::models::Dataset;
use crate::constants::STALE_SUFFIX;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the staging area holds for a dataset after extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedInput {
    /// Written after the area was prepared in this run
    Fresh(PathBuf),
    /// Left over from an earlier run
    Stale(PathBuf),
    /// Nothing to load; carries the expected staging path
    Missing(PathBuf),
}

impl fmt::Display for StagedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagedInput::Fresh(path) => write!(f, "fresh {}", path.display()),
            StagedInput::Stale(path) => write!(f, "stale {}", path.display()),
            StagedInput::Missing(path) => write!(f, "missing {}", path.display()),
        }
    }
}

/// Tracks extraction output freshness within one run
#[derive(Debug)]
pub struct StagingArea {
    work_dir: PathBuf,
    accept_stale: bool,
    prepared: HashSet<Dataset>,
}

impl StagingArea {
    pub fn new(work_dir: impl Into<PathBuf>, accept_stale: bool) -> Self {
        Self {
            work_dir: work_dir.into(),
            accept_stale,
            prepared: HashSet::new(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Where the extraction command writes this dataset
    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.work_dir.join(dataset.staging_file_name())
    }

    /// Where the previous output is kept while a new extraction runs
    pub fn stale_path_for(&self, dataset: Dataset) -> PathBuf {
        self.work_dir
            .join(format!("{}.{}", dataset.staging_file_name(), STALE_SUFFIX))
    }

    /// Move any existing output aside and mark the dataset as prepared
    ///
    /// An older `.stale` file is replaced.
    pub fn prepare(&mut self, dataset: Dataset) -> Result<()> {
        let path = self.path_for(dataset);
        if path.exists() {
            let stale_path = self.stale_path_for(dataset);
            std::fs::rename(&path, &stale_path).map_err(|e| {
                Error::io(
                    format!(
                        "Failed to move {} aside to {}",
                        path.display(),
                        stale_path.display()
                    ),
                    e,
                )
            })?;
            debug!(dataset = %dataset, "Moved previous output to {}", stale_path.display());
        }
        self.prepared.insert(dataset);
        Ok(())
    }

    /// Prepare every dataset
    pub fn prepare_all(&mut self) -> Result<usize> {
        std::fs::create_dir_all(&self.work_dir).map_err(|e| {
            Error::io(
                format!("Failed to create work directory {}", self.work_dir.display()),
                e,
            )
        })?;
        for dataset in Dataset::ALL {
            self.prepare(dataset)?;
        }
        info!(
            "Staging area ready in {} ({} datasets)",
            self.work_dir.display(),
            self.prepared.len()
        );
        Ok(self.prepared.len())
    }

    pub fn is_prepared(&self, dataset: Dataset) -> bool {
        self.prepared.contains(&dataset)
    }

    /// Classify what is available for a dataset right now
    pub fn resolve(&self, dataset: Dataset) -> StagedInput {
        let path = self.path_for(dataset);
        let stale_path = self.stale_path_for(dataset);

        if path.exists() {
            if self.is_prepared(dataset) {
                StagedInput::Fresh(path)
            } else {
                StagedInput::Stale(path)
            }
        } else if stale_path.exists() {
            StagedInput::Stale(stale_path)
        } else {
            StagedInput::Missing(path)
        }
    }

    /// The file a load step should read, honoring the stale-input policy
    pub fn input_for_load(&self, dataset: Dataset) -> Result<PathBuf> {
        match self.resolve(dataset) {
            StagedInput::Fresh(path) => Ok(path),
            StagedInput::Stale(path) if self.accept_stale => {
                warn!(
                    dataset = %dataset,
                    "Loading stale input {} from an earlier run",
                    path.display()
                );
                Ok(path)
            }
            StagedInput::Stale(path) => Err(Error::stale_input(
                dataset.table_name(),
                path.display().to_string(),
            )),
            StagedInput::Missing(path) => Err(Error::missing_input(
                dataset.table_name(),
                path.display().to_string(),
            )),
        }
    }
}
