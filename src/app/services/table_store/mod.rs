//! Remote tabular store
//!
//! The pipeline talks to the store through the [`TableStore`] trait:
//!
//! - [`rest`] - Supabase/PostgREST implementation over HTTP
//! - [`memory`] - in-process implementation for tests and dry runs

pub mod memory;
pub mod rest;

#[cfg(test)]
pub mod tests;

pub use memory::{MemoryTableStore, UpsertCall};
pub use rest::RestTableStore;

use crate::app::models::Row;
use crate::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

/// Check a table or column name before it is placed in a request
pub fn validate_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER_PATTERN.is_match(name) {
        Ok(name)
    } else {
        Err(Error::invalid_identifier(name))
    }
}

/// Half-open text range `[gte, lt)` on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub column: String,
    pub gte: String,
    pub lt: String,
}

impl RangeFilter {
    pub fn new(column: impl Into<String>, gte: impl Into<String>, lt: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            gte: gte.into(),
            lt: lt.into(),
        }
    }

    /// `[year-01-01, (year+1)-01-01)` on `column`
    pub fn year(column: impl Into<String>, year: i32) -> Self {
        Self::new(column, format!("{}-01-01", year), format!("{}-01-01", year + 1))
    }

    /// Whether a canonical text value falls inside the range
    pub fn contains(&self, value: &str) -> bool {
        value >= self.gte.as_str() && value < self.lt.as_str()
    }
}

/// Operations the pipeline needs from the remote store
#[async_trait]
pub trait TableStore: Send + Sync {
    /// All rows of `table` inside `filter`, ordered by `order_by` ascending
    async fn select_range(
        &self,
        table: &str,
        filter: &RangeFilter,
        order_by: &[&str],
    ) -> Result<Vec<Row>>;

    /// Exact number of rows, optionally restricted to a range
    async fn count(&self, table: &str, filter: Option<&RangeFilter>) -> Result<u64>;

    /// Insert rows, overwriting any row that shares the `conflict_key` columns
    async fn upsert(&self, table: &str, conflict_key: &[&str], rows: &[Row]) -> Result<()>;
}
