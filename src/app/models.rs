//! Data models for Sungrow synchronization
//!
//! This module contains the dataset catalogue (table names, natural keys,
//! indexing columns and extraction window conventions), the in-memory table
//! representation, and the extraction window passed to external commands.

use crate::constants::{self, DATE_COLUMN, DEVICE_COLUMN, TIMESTAMP_COLUMN, WINDOW_DAY_FORMAT};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Dataset Catalogue
// =============================================================================

/// The four datasets synchronized every day
///
/// Each dataset maps to one remote table of the same name and one staged
/// CSV file produced by its extraction command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    InverterMeasures,
    CombinerMeasures,
    YieldDaily,
    FaultAlarms,
}

/// How an extraction window is expressed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFormat {
    /// `YYYYMMDDHHMMSS` start and end
    Timestamp,
    /// `YYYYMMDD` start and end
    Date,
}

impl Dataset {
    /// All datasets in run order
    pub const ALL: [Dataset; 4] = [
        Dataset::InverterMeasures,
        Dataset::CombinerMeasures,
        Dataset::YieldDaily,
        Dataset::FaultAlarms,
    ];

    /// Remote table name (also the staged file stem)
    pub fn table_name(&self) -> &'static str {
        match self {
            Dataset::InverterMeasures => "inverter_measures",
            Dataset::CombinerMeasures => "combiner_measures",
            Dataset::YieldDaily => "yield_daily",
            Dataset::FaultAlarms => "fault_alarms",
        }
    }

    /// Short human label used in run logs
    pub fn label(&self) -> &'static str {
        match self {
            Dataset::InverterMeasures => "inverters",
            Dataset::CombinerMeasures => "combiners",
            Dataset::YieldDaily => "yield",
            Dataset::FaultAlarms => "fault alarms",
        }
    }

    /// Column holding the record instant; range filters for snapshots apply here
    pub fn index_column(&self) -> &'static str {
        match self {
            Dataset::YieldDaily => DATE_COLUMN,
            _ => TIMESTAMP_COLUMN,
        }
    }

    /// Columns that identify one logical record across repeated syncs
    pub fn natural_key(&self) -> [&'static str; 2] {
        [self.index_column(), DEVICE_COLUMN]
    }

    /// Window convention expected by this dataset's extraction command
    pub fn window_format(&self) -> WindowFormat {
        match self {
            Dataset::YieldDaily => WindowFormat::Date,
            _ => WindowFormat::Timestamp,
        }
    }

    /// File name of the staged extraction output
    pub fn staging_file_name(&self) -> String {
        format!("{}.{}", self.table_name(), constants::CSV_EXTENSION)
    }

    /// File name of the annual snapshot for `year`
    pub fn snapshot_file_name(&self, year: i32) -> String {
        format!(
            "{}_{}.{}",
            self.table_name(),
            year,
            constants::CSV_EXTENSION
        )
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Dataset::ALL
            .into_iter()
            .find(|dataset| dataset.table_name() == normalized)
            .ok_or_else(|| Error::unknown_dataset(s))
    }
}

// =============================================================================
// Tabular Data
// =============================================================================

/// One record: column name to JSON value, in column order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// An in-memory table loaded from an extracted file or read back from the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in file order
    pub columns: Vec<String>,
    /// Rows in file order
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a table from columns and rows
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there is nothing to insert
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check whether a column is present
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }
}

// =============================================================================
// Extraction Window
// =============================================================================

/// The `(start, end)` tokens passed to an extraction command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWindow {
    pub start: String,
    pub end: String,
}

impl ExtractionWindow {
    /// Build the window covering `day` in the given convention
    ///
    /// `day_start` and `day_end` are `HHMMSS` tokens and only apply to
    /// [`WindowFormat::Timestamp`]; date windows use the day token for both ends.
    pub fn for_day(day: NaiveDate, format: WindowFormat, day_start: &str, day_end: &str) -> Self {
        let day_token = day.format(WINDOW_DAY_FORMAT).to_string();
        match format {
            WindowFormat::Timestamp => Self {
                start: format!("{}{}", day_token, day_start),
                end: format!("{}{}", day_token, day_end),
            },
            WindowFormat::Date => Self {
                start: day_token.clone(),
                end: day_token,
            },
        }
    }

    /// Command-line arguments understood by the extraction scripts
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--start".to_string(),
            self.start.clone(),
            "--end".to_string(),
            self.end.clone(),
        ]
    }
}

impl fmt::Display for ExtractionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
