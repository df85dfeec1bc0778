//! Batched upserts into the remote store
//!
//! Rows are sent in fixed-size batches in their original order, each batch
//! as one conflict-resolving write keyed by the dataset's natural key. The
//! first rejected batch stops the dataset; batches already written stay.
//!
//! Rows repeating a natural key are collapsed before batching, keeping the
//! last occurrence: a single conflict-resolving statement cannot touch the
//! same key twice.

use super::table_store::TableStore;
use crate::app::models::{Dataset, Row, Table};
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows {msg}";

/// Outcome of loading one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertSummary {
    pub table: &'static str,
    pub rows_written: usize,
    pub batches: usize,
}

/// Writes a [`Table`] to a [`TableStore`] in batches
pub struct BatchedUpserter<'a> {
    store: &'a dyn TableStore,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> BatchedUpserter<'a> {
    pub fn new(store: &'a dyn TableStore, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::configuration("Batch size must be greater than 0"));
        }
        Ok(Self {
            store,
            batch_size,
            show_progress: false,
        })
    }

    /// Show an indicatif progress bar while writing
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, dataset: Dataset, rows: usize) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(rows as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(dataset.table_name());
        Some(pb)
    }

    /// Upsert every row of `table` into the dataset's remote table
    pub async fn upsert(&self, dataset: Dataset, table: &Table) -> Result<UpsertSummary> {
        let table_name = dataset.table_name();
        let conflict_key = dataset.natural_key();

        if table.is_empty() {
            info!(table = table_name, "No rows to insert");
            return Ok(UpsertSummary {
                table: table_name,
                rows_written: 0,
                batches: 0,
            });
        }

        let rows = collapse_duplicate_keys(&table.rows, &conflict_key);
        if rows.len() < table.len() {
            info!(
                table = table_name,
                "Collapsed {} rows repeating a natural key",
                table.len() - rows.len()
            );
        }

        let total_batches = rows.len().div_ceil(self.batch_size);
        info!(
            table = table_name,
            rows = rows.len(),
            "Inserting in {} batches of up to {}",
            total_batches,
            self.batch_size
        );

        let progress_bar = self.progress_bar(dataset, rows.len());
        let mut rows_written = 0;

        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let batch_number = index + 1;

            if let Err(e) = self.store.upsert(table_name, &conflict_key, batch).await {
                error!(
                    table = table_name,
                    batch = batch_number,
                    "Batch {}/{} failed: {}",
                    batch_number,
                    total_batches,
                    e
                );
                if let Some(pb) = &progress_bar {
                    pb.abandon_with_message(format!(
                        "{} failed at batch {}",
                        table_name, batch_number
                    ));
                }
                return Err(Error::batch_write(table_name, batch_number, rows_written, e));
            }

            rows_written += batch.len();
            debug!(
                table = table_name,
                batch = batch_number,
                rows = batch.len(),
                "Batch {}/{} written",
                batch_number,
                total_batches
            );
            if let Some(pb) = &progress_bar {
                pb.inc(batch.len() as u64);
            }
        }

        if let Some(pb) = &progress_bar {
            pb.finish_with_message(format!("{} done", table_name));
        }
        info!(table = table_name, rows = rows_written, "All batches written");

        Ok(UpsertSummary {
            table: table_name,
            rows_written,
            batches: total_batches,
        })
    }
}

/// Drop every row whose natural key appears again later, keeping row order
pub fn collapse_duplicate_keys(rows: &[Row], conflict_key: &[&str]) -> Vec<Row> {
    let key_of = |row: &Row| -> Vec<Option<String>> {
        conflict_key
            .iter()
            .map(|column| row.get(*column).map(Value::to_string))
            .collect()
    };

    let mut seen = HashSet::new();
    let mut kept: Vec<&Row> = rows
        .iter()
        .rev()
        .filter(|row| seen.insert(key_of(*row)))
        .collect();
    kept.reverse();
    kept.into_iter().cloned().collect()
}
