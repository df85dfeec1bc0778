//! Sungrow Sync Library
//!
//! A Rust library for pulling daily Sungrow plant telemetry through external
//! extraction commands and landing it in a Supabase (PostgREST) store.
//!
//! This library provides tools for:
//! - Refreshing the provider credential and running the extraction commands
//! - Tracking extraction output in a staging area with freshness tags
//! - Normalizing extracted CSV files (canonical timestamps, explicit nulls)
//! - Upserting rows in ordered batches keyed by each dataset's natural key
//! - Writing annual CSV snapshots of every table after a clean run
//! - Step-by-step outcome accounting for the whole daily run

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod batch_upserter;
        pub mod credential;
        pub mod extractor;
        pub mod normalizer;
        pub mod pipeline;
        pub mod process_runner;
        pub mod snapshot;
        pub mod staging;
        pub mod table_store;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Dataset, Row, Table};
pub use config::Config;

/// Result type alias for the sync pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for every stage of the synchronization run
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Credential renewal failed; fatal for the whole run
    #[error("Credential refresh failed: {reason}")]
    CredentialRefresh { reason: String },

    /// An extraction command failed or timed out
    #[error("Extraction failed for {dataset}: {reason}")]
    Extraction { dataset: String, reason: String },

    /// A child process could not be spawned or awaited
    #[error("Process '{program}' failed: {reason}")]
    Process { program: String, reason: String },

    /// A child process exceeded its time budget and was killed
    #[error("Process '{program}' timed out after {timeout_secs}s")]
    ProcessTimeout { program: String, timeout_secs: u64 },

    /// Extracted file could not be loaded or coerced
    #[error("Normalization error in '{file}': {message}")]
    Normalization { file: String, message: String },

    /// Staged input was left over from an earlier run
    #[error("Stale input for {dataset}: {path} was not produced by this run")]
    StaleInput { dataset: String, path: String },

    /// No staged input exists for a dataset
    #[error("Missing input for {dataset}: {path} does not exist")]
    MissingInput { dataset: String, path: String },

    /// An upsert batch was rejected; earlier batches stay written
    #[error(
        "Batch {batch} for table '{table}' failed after {rows_written} rows were written: {source}"
    )]
    BatchWrite {
        table: String,
        batch: usize,
        rows_written: usize,
        #[source]
        source: Box<Error>,
    },

    /// Annual snapshot could not be produced
    #[error("Snapshot of '{table}' for {year} failed: {message}")]
    Snapshot {
        table: String,
        year: i32,
        message: String,
    },

    /// HTTP transport error talking to the remote store
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote store answered with a non-success status
    #[error("Remote store returned {status}: {message}")]
    Store { status: u16, message: String },

    /// Table or column name that cannot be used in a request path
    #[error("Invalid identifier: '{name}'")]
    InvalidIdentifier { name: String },

    /// Polars data processing error
    #[error("Polars error: {message}")]
    Polars {
        message: String,
        #[source]
        source: polars::error::PolarsError,
    },

    /// Unknown dataset name
    #[error("Unknown dataset: {name}")]
    UnknownDataset { name: String },

    /// Run interrupted by the operator
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a credential refresh error
    pub fn credential_refresh(reason: impl Into<String>) -> Self {
        Self::CredentialRefresh {
            reason: reason.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }

    /// Create a process error
    pub fn process(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Process {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Create a process timeout error
    pub fn process_timeout(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self::ProcessTimeout {
            program: program.into(),
            timeout_secs,
        }
    }

    /// Create a normalization error
    pub fn normalization(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Normalization {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a stale input error
    pub fn stale_input(dataset: impl Into<String>, path: impl Into<String>) -> Self {
        Self::StaleInput {
            dataset: dataset.into(),
            path: path.into(),
        }
    }

    /// Create a missing input error
    pub fn missing_input(dataset: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MissingInput {
            dataset: dataset.into(),
            path: path.into(),
        }
    }

    /// Create a batch write error wrapping the store failure
    pub fn batch_write(
        table: impl Into<String>,
        batch: usize,
        rows_written: usize,
        source: Error,
    ) -> Self {
        Self::BatchWrite {
            table: table.into(),
            batch,
            rows_written,
            source: Box::new(source),
        }
    }

    /// Create a snapshot error
    pub fn snapshot(table: impl Into<String>, year: i32, message: impl Into<String>) -> Self {
        Self::Snapshot {
            table: table.into(),
            year,
            message: message.into(),
        }
    }

    /// Create a remote store status error
    pub fn store(status: u16, message: impl Into<String>) -> Self {
        Self::Store {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }

    /// Create an unknown dataset error
    pub fn unknown_dataset(name: impl Into<String>) -> Self {
        Self::UnknownDataset { name: name.into() }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<polars::error::PolarsError> for Error {
    fn from(error: polars::error::PolarsError) -> Self {
        Self::Polars {
            message: "Polars operation failed".to_string(),
            source: error,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Http {
            message: "Request to remote store failed".to_string(),
            source: error,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid configuration file: {}", error),
        }
    }
}
