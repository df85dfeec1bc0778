//! Annual snapshot generation
//!
//! Reads one calendar year of a table back from the remote store and writes
//! it to `{archive_dir}/{table}_{year}.csv`. A year without rows produces no
//! file.

use super::table_store::{RangeFilter, TableStore};
use crate::app::models::{Dataset, Row};
use crate::{Error, Result};
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Result of one snapshot request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Written { path: PathBuf, rows: usize },
    NoData,
}

/// Snapshot result for one dataset, failures kept as text for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub dataset: Dataset,
    pub year: i32,
    pub outcome: std::result::Result<SnapshotOutcome, String>,
}

impl SnapshotRecord {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Writes annual CSV snapshots of remote tables
pub struct SnapshotGenerator<'a> {
    store: &'a dyn TableStore,
    archive_dir: PathBuf,
}

impl<'a> SnapshotGenerator<'a> {
    pub fn new(store: &'a dyn TableStore, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            archive_dir: archive_dir.into(),
        }
    }

    /// Path the snapshot of `dataset` for `year` is written to
    pub fn path_for(&self, dataset: Dataset, year: i32) -> PathBuf {
        self.archive_dir.join(dataset.snapshot_file_name(year))
    }

    /// Snapshot one table for one year
    pub async fn generate(&self, dataset: Dataset, year: i32) -> Result<SnapshotOutcome> {
        let table = dataset.table_name();
        let filter = RangeFilter::year(dataset.index_column(), year);

        let rows = self
            .store
            .select_range(table, &filter, &dataset.natural_key())
            .await
            .map_err(|e| Error::snapshot(table, year, e.to_string()))?;

        if rows.is_empty() {
            info!(table, year, "No data for snapshot");
            return Ok(SnapshotOutcome::NoData);
        }

        match self.store.count(table, Some(&filter)).await {
            Ok(expected) if expected != rows.len() as u64 => {
                return Err(Error::snapshot(
                    table,
                    year,
                    format!(
                        "fetched {} rows but the store reports {}",
                        rows.len(),
                        expected
                    ),
                ));
            }
            Ok(_) => {}
            Err(e) => warn!(table, year, "Could not verify row count: {}", e),
        }

        std::fs::create_dir_all(&self.archive_dir).map_err(|e| {
            Error::snapshot(
                table,
                year,
                format!("cannot create {}: {}", self.archive_dir.display(), e),
            )
        })?;

        let path = self.path_for(dataset, year);
        let written_path = path.clone();
        let row_count = tokio::task::spawn_blocking(move || write_snapshot(&written_path, &rows))
            .await
            .map_err(|e| Error::snapshot(table, year, format!("writer task failed: {}", e)))?
            .map_err(|e| Error::snapshot(table, year, e.to_string()))?;

        info!(table, year, rows = row_count, "Snapshot written to {}", path.display());
        Ok(SnapshotOutcome::Written {
            path,
            rows: row_count,
        })
    }

    /// Snapshot each dataset in turn; failures are logged and recorded
    pub async fn generate_all(&self, datasets: &[Dataset], year: i32) -> Vec<SnapshotRecord> {
        let mut records = Vec::with_capacity(datasets.len());
        for &dataset in datasets {
            let outcome = match self.generate(dataset, year).await {
                Ok(outcome) => Ok(outcome),
                Err(e) => {
                    error!(table = dataset.table_name(), year, "Snapshot failed: {}", e);
                    Err(e.to_string())
                }
            };
            records.push(SnapshotRecord {
                dataset,
                year,
                outcome,
            });
        }
        records
    }
}

fn cell_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Union of row columns in first-seen order
fn union_columns(rows: &[Row]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for column in row.keys() {
            if seen.insert(column.as_str()) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

/// Write rows as a CSV file with a header; missing cells are left empty
pub fn write_snapshot(path: &Path, rows: &[Row]) -> Result<usize> {
    let columns = union_columns(rows)
        .into_iter()
        .map(|name| {
            let values: Vec<Option<String>> =
                rows.iter().map(|row| cell_text(row.get(&name))).collect();
            Column::new(name.as_str().into(), values)
        })
        .collect::<Vec<_>>();

    let mut df = DataFrame::new(columns)?;
    let mut file = File::create(path)
        .map_err(|e| Error::io(format!("Failed to create {}", path.display()), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    Ok(df.height())
}
