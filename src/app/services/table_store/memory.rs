//! In-process table store
//!
//! Keeps rows per table keyed by the conflict columns given to each upsert,
//! so repeated writes overwrite like the remote store does. Like a single
//! conflict-resolving statement, one call is applied entirely or not at all,
//! and may not name the same key twice. Every upsert call is recorded for
//! inspection.

use super::{RangeFilter, TableStore, validate_identifier};
use crate::app::models::Row;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// One recorded upsert call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub table: String,
    pub rows: usize,
}

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<Row>,
    index: HashMap<Vec<String>, usize>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, MemoryTable>,
    calls: Vec<UpsertCall>,
}

/// [`TableStore`] holding everything in memory
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<MemoryState>,
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_by(order_by: &[&str], a: &Row, b: &Row) -> Ordering {
    order_by
        .iter()
        .map(|column| {
            let left = a.get(*column).and_then(value_text);
            let right = b.get(*column).and_then(value_text);
            left.cmp(&right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current rows of a table in insertion order
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.state()
            .tables
            .get(table)
            .map_or(0, |t| t.rows.len())
    }

    /// Upsert calls received so far, in order
    pub fn upsert_calls(&self) -> Vec<UpsertCall> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn select_range(
        &self,
        table: &str,
        filter: &RangeFilter,
        order_by: &[&str],
    ) -> Result<Vec<Row>> {
        validate_identifier(table)?;
        validate_identifier(&filter.column)?;

        let state = self.state();
        let mut rows: Vec<Row> = state
            .tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| {
                        row.get(&filter.column)
                            .and_then(value_text)
                            .is_some_and(|text| filter.contains(&text))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by(|a, b| compare_by(order_by, a, b));
        Ok(rows)
    }

    async fn count(&self, table: &str, filter: Option<&RangeFilter>) -> Result<u64> {
        validate_identifier(table)?;

        let state = self.state();
        let Some(stored) = state.tables.get(table) else {
            return Ok(0);
        };
        let count = match filter {
            Some(filter) => stored
                .rows
                .iter()
                .filter(|row| {
                    row.get(&filter.column)
                        .and_then(value_text)
                        .is_some_and(|text| filter.contains(&text))
                })
                .count(),
            None => stored.rows.len(),
        };
        Ok(count as u64)
    }

    async fn upsert(&self, table: &str, conflict_key: &[&str], rows: &[Row]) -> Result<()> {
        validate_identifier(table)?;
        for column in conflict_key {
            validate_identifier(column)?;
        }

        let mut state = self.state();
        state.calls.push(UpsertCall {
            table: table.to_string(),
            rows: rows.len(),
        });

        // Resolve every key before touching stored rows; a rejected call writes nothing
        let keys = rows
            .iter()
            .map(|row| {
                conflict_key
                    .iter()
                    .map(|column| {
                        row.get(*column).and_then(value_text).ok_or_else(|| {
                            Error::store(
                                400,
                                format!("row has no value for conflict column '{}'", column),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        if let Some(repeated) = keys.iter().find(|key| !seen.insert(*key)) {
            return Err(Error::store(
                500,
                format!(
                    "ON CONFLICT DO UPDATE command cannot affect row a second time (key {})",
                    repeated.join(", ")
                ),
            ));
        }

        let stored = state.tables.entry(table.to_string()).or_default();
        for (key, row) in keys.into_iter().zip(rows) {
            match stored.index.get(&key) {
                Some(&position) => {
                    let existing = &mut stored.rows[position];
                    for (column, value) in row {
                        existing.insert(column.clone(), value.clone());
                    }
                }
                None => {
                    stored.index.insert(key, stored.rows.len());
                    stored.rows.push(row.clone());
                }
            }
        }
        Ok(())
    }
}
