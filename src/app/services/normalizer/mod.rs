//! Tabular normalizer for extracted CSV files
//!
//! Loads one extraction output fully into memory with polars, then coerces
//! the indexing columns to canonical text and maps every spelling of a
//! missing value to an explicit JSON null.
//!
//! ## Rules
//!
//! - A zero-byte, whitespace-only or header-only file is an empty table.
//! - `timestamp` cells become `YYYY-MM-DD HH:MM:SS`; `date` cells `YYYY-MM-DD`.
//! - NaN floats and null tokens (`nan`, `NA`, empty cells, ...) become null.
//! - A value that cannot be coerced fails the whole file with
//!   [`Error::Normalization`](crate::Error::Normalization) naming the column,
//!   data row and value.

pub mod field_parsers;

#[cfg(test)]
pub mod tests;

use crate::app::models::{Row, Table};
use crate::constants::{DATE_COLUMN, NULL_TOKENS, TIMESTAMP_COLUMN};
use crate::{Error, Result};
use polars::prelude::*;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

pub use field_parsers::{any_value_to_json, coerce_date, coerce_timestamp, parse_datetime};

/// Load and normalize one extracted file
pub fn normalize_file(path: &Path) -> Result<Table> {
    let table = load_table(path)?;
    normalize_table(table, &path.display().to_string())
}

/// Read a CSV file into a [`Table`] without coercion
pub fn load_table(path: &Path) -> Result<Table> {
    let file_label = path.display().to_string();
    let raw = std::fs::read(path)
        .map_err(|e| Error::normalization(&file_label, format!("cannot read file: {}", e)))?;

    if raw.iter().all(u8::is_ascii_whitespace) {
        debug!("{} is empty", file_label);
        return Ok(Table::default());
    }

    let null_values = NULL_TOKENS
        .iter()
        .map(|token| PlSmallStr::from(*token))
        .collect::<Vec<_>>();

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(null_values))),
        )
        .into_reader_with_file_handle(Cursor::new(raw))
        .finish()
        .map_err(|e| Error::normalization(&file_label, format!("invalid CSV: {}", e)))?;

    let table = dataframe_to_table(&df)
        .map_err(|e| Error::normalization(&file_label, e.to_string()))?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        file_label
    );
    Ok(table)
}

fn dataframe_to_table(df: &DataFrame) -> PolarsResult<Table> {
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let series: Vec<&Series> = df
        .get_columns()
        .iter()
        .map(|column| column.as_materialized_series())
        .collect();

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut row = Row::new();
        for (name, series) in columns.iter().zip(&series) {
            row.insert(name.clone(), any_value_to_json(&series.get(idx)?));
        }
        rows.push(row);
    }
    Ok(Table::new(columns, rows))
}

/// Coerce the indexing columns present in `table`
///
/// `file_label` only appears in error messages.
pub fn normalize_table(mut table: Table, file_label: &str) -> Result<Table> {
    let coercions: Vec<(&str, fn(&Value) -> Option<Value>)> = [
        (TIMESTAMP_COLUMN, coerce_timestamp as fn(&Value) -> Option<Value>),
        (DATE_COLUMN, coerce_date),
    ]
    .into_iter()
    .filter(|(column, _)| table.has_column(column))
    .collect();

    if coercions.is_empty() {
        return Ok(table);
    }

    for (index, row) in table.rows.iter_mut().enumerate() {
        for (column, coerce) in &coercions {
            let Some(value) = row.get_mut(*column) else {
                continue;
            };
            let coerced = coerce(value).ok_or_else(|| {
                Error::normalization(
                    file_label,
                    format!(
                        "cannot parse value {} in column '{}' at data row {}",
                        value,
                        column,
                        index + 1
                    ),
                )
            })?;
            *value = coerced;
        }
    }
    Ok(table)
}
