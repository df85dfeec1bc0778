//! Application constants for Sungrow Sync
//!
//! This module contains configuration defaults, column names, formats
//! and environment variable names used throughout the application.

// =============================================================================
// Datasets and Columns
// =============================================================================

/// Supported dataset (and remote table) names, in run order
pub const DATASET_NAMES: &[&str] = &[
    "inverter_measures",
    "combiner_measures",
    "yield_daily",
    "fault_alarms",
];

/// Indexing column of the time-indexed datasets
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Indexing column of the daily yield dataset
pub const DATE_COLUMN: &str = "date";

/// Device identifier column, second half of every natural key
pub const DEVICE_COLUMN: &str = "device";

/// Extension of staged extraction output and snapshot files
pub const CSV_EXTENSION: &str = "csv";

/// Suffix for extraction output moved aside before a new extraction
pub const STALE_SUFFIX: &str = "stale";

// =============================================================================
// Formats
// =============================================================================

/// Canonical timestamp text sent to the remote store
pub const TIMESTAMP_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical date text sent to the remote store
pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";

/// Provider day token used in extraction windows
pub const WINDOW_DAY_FORMAT: &str = "%Y%m%d";

/// Provider time-of-day token format (appended to the day token)
pub const WINDOW_TIME_FORMAT: &str = "%H%M%S";

/// Cell values treated as missing when loading extracted CSV files
pub const NULL_TOKENS: &[&str] = &[
    "", "nan", "NaN", "NAN", "NA", "N/A", "n/a", "NULL", "null", "None", "#N/A", "<NA>",
];

// =============================================================================
// Pipeline Defaults
// =============================================================================

/// Rows per upsert request
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Rows per page when reading a table back for snapshots
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Credential renewal time budget
pub const DEFAULT_CREDENTIAL_TIMEOUT_SECS: u64 = 60;

/// Per-dataset extraction time budget
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 3600;

/// HTTP request time budget for the remote store
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Days before today that the daily run synchronizes.
///
/// Two days back keeps clear of the provider's own nightly post-processing.
pub const DEFAULT_DAY_OFFSET: u32 = 2;

/// First extraction instant of the target day (HHMMSS)
pub const DEFAULT_DAY_START: &str = "000000";

/// Last extraction instant of the target day (HHMMSS), the provider's final 5-minute slot
pub const DEFAULT_DAY_END: &str = "235500";

/// Interpreter used by the default external commands
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Default external login script
pub const DEFAULT_LOGIN_SCRIPT: &str = "login_script.py";

/// Default log level when no verbosity flag is given
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Remote Store
// =============================================================================

/// PostgREST path prefix under the Supabase URL
pub const REST_PATH: &str = "rest/v1";

/// Prefer header for idempotent batch writes
pub const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// Prefer header for row-count queries
pub const COUNT_PREFER: &str = "count=exact";

// =============================================================================
// Configuration Locations
// =============================================================================

/// Directory name under the user config directory
pub const CONFIG_DIR_NAME: &str = "sungrow-sync";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variables read on top of the configuration file
pub mod env_vars {
    pub const SUPABASE_URL: &str = "SUPABASE_URL";
    pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
    pub const SUPABASE_KEY: &str = "SUPABASE_KEY";
    pub const WORK_DIR: &str = "SUNGROW_SYNC_WORK_DIR";
    pub const ARCHIVE_DIR: &str = "SUNGROW_SYNC_ARCHIVE_DIR";
    pub const BATCH_SIZE: &str = "SUNGROW_SYNC_BATCH_SIZE";
    pub const DAY_OFFSET: &str = "SUNGROW_SYNC_DAY_OFFSET";
    pub const LOG_FILE: &str = "SUNGROW_SYNC_LOG_FILE";
}
