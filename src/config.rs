//! Configuration management and validation.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables (including a `.env` file), then command-line
//! overrides applied by the CLI. The resulting [`Config`] is built once per
//! process and passed by reference to every component of a run.

use crate::app::models::Dataset;
use crate::constants::{self, env_vars};
use crate::{Error, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Remote store (Supabase/PostgREST) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base project URL, e.g. `http://localhost:54321`
    pub url: String,

    /// API key sent as `apikey` and bearer token
    pub api_key: String,

    /// Per-request time budget
    pub request_timeout_secs: u64,

    /// Rows per page when reading tables back
    pub page_size: usize,
}

/// External login command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,

    /// Time budget for one renewal
    pub timeout_secs: u64,
}

/// External extraction command settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub inverter_measures: Vec<String>,
    pub combiner_measures: Vec<String>,
    pub yield_daily: Vec<String>,
    pub fault_alarms: Vec<String>,

    /// Time budget for one extraction
    pub timeout_secs: u64,

    /// First instant of the target day (`HHMMSS`)
    pub day_start: String,

    /// Last instant of the target day (`HHMMSS`)
    pub day_end: String,
}

/// Run-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Working directory of the extraction commands; staged files live here
    pub work_dir: PathBuf,

    /// Destination of annual snapshot files
    pub archive_dir: PathBuf,

    /// Rows per upsert request
    pub batch_size: usize,

    /// Days before today synchronized by a scheduled run
    pub day_offset: u32,

    /// Load a previous run's file when an extraction produced nothing
    pub accept_stale_inputs: bool,

    /// Regenerate annual snapshots after a clean run
    pub snapshots_enabled: bool,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the crate's targets
    pub level: String,

    /// Optional log file written alongside stderr
    pub file: Option<PathBuf>,
}

/// Complete configuration for one process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub credential: CredentialConfig,
    pub extraction: ExtractionConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

fn script_command(script: &str) -> Vec<String> {
    vec![constants::DEFAULT_INTERPRETER.to_string(), script.to_string()]
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            page_size: constants::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            command: script_command(constants::DEFAULT_LOGIN_SCRIPT),
            timeout_secs: constants::DEFAULT_CREDENTIAL_TIMEOUT_SECS,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            inverter_measures: script_command("get_inverter_measures.py"),
            combiner_measures: script_command("get_combiner_measures.py"),
            yield_daily: script_command("get_yield_daily.py"),
            fault_alarms: script_command("get_fault_alarms.py"),
            timeout_secs: constants::DEFAULT_EXTRACTION_TIMEOUT_SECS,
            day_start: constants::DEFAULT_DAY_START.to_string(),
            day_end: constants::DEFAULT_DAY_END.to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            archive_dir: PathBuf::from("."),
            batch_size: constants::DEFAULT_BATCH_SIZE,
            day_offset: constants::DEFAULT_DAY_OFFSET,
            accept_stale_inputs: false,
            snapshots_enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: constants::DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl StoreConfig {
    /// Request time budget as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check that the store can be contacted with these settings
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::configuration(format!(
                "Remote store URL is not set (use [store].url or {})",
                env_vars::SUPABASE_URL
            )));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(Error::configuration(format!(
                "Remote store URL must use http or https: '{}'",
                self.url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::configuration(format!(
                "Remote store API key is not set (use [store].api_key or {})",
                env_vars::SUPABASE_ANON_KEY
            )));
        }
        if self.page_size == 0 {
            return Err(Error::configuration("store.page_size must be greater than 0"));
        }
        Ok(())
    }
}

impl CredentialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ExtractionConfig {
    /// Command line configured for a dataset's extraction
    pub fn command_for(&self, dataset: Dataset) -> &[String] {
        match dataset {
            Dataset::InverterMeasures => &self.inverter_measures,
            Dataset::CombinerMeasures => &self.combiner_measures,
            Dataset::YieldDaily => &self.yield_daily,
            Dataset::FaultAlarms => &self.fault_alarms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Default configuration file location (`<config dir>/sungrow-sync/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Parse a TOML configuration file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read configuration file '{}'", path.display()),
                e,
            )
        })?;
        let config: Config = toml::from_str(&content)?;
        debug!("Parsed configuration file {}", path.display());
        Ok(config)
    }

    /// Load defaults, then the file (if any), then the process environment
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = read(env_vars::SUPABASE_URL) {
            self.store.url = url;
        }
        if let Some(key) =
            read(env_vars::SUPABASE_ANON_KEY).or_else(|| read(env_vars::SUPABASE_KEY))
        {
            self.store.api_key = key;
        }
        if let Some(dir) = read(env_vars::WORK_DIR) {
            self.pipeline.work_dir = PathBuf::from(dir);
        }
        if let Some(dir) = read(env_vars::ARCHIVE_DIR) {
            self.pipeline.archive_dir = PathBuf::from(dir);
        }
        if let Some(value) = read(env_vars::BATCH_SIZE) {
            self.pipeline.batch_size = value.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{} must be a positive integer, got '{}'",
                    env_vars::BATCH_SIZE,
                    value
                ))
            })?;
        }
        if let Some(value) = read(env_vars::DAY_OFFSET) {
            self.pipeline.day_offset = value.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{} must be a non-negative integer, got '{}'",
                    env_vars::DAY_OFFSET,
                    value
                ))
            })?;
        }
        if let Some(file) = read(env_vars::LOG_FILE) {
            self.logging.file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    /// Validate settings that every command depends on
    ///
    /// Store credentials are checked separately by [`StoreConfig::validate`]
    /// so that offline commands (dry runs) work without them.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.batch_size == 0 {
            return Err(Error::configuration("pipeline.batch_size must be greater than 0"));
        }
        if self.credential.command.is_empty() {
            return Err(Error::configuration("credential.command cannot be empty"));
        }
        for dataset in Dataset::ALL {
            if self.extraction.command_for(dataset).is_empty() {
                return Err(Error::configuration(format!(
                    "extraction.{} command cannot be empty",
                    dataset
                )));
            }
        }
        for (name, value) in [
            ("extraction.day_start", &self.extraction.day_start),
            ("extraction.day_end", &self.extraction.day_end),
        ] {
            if value.len() != 6
                || NaiveTime::parse_from_str(value, constants::WINDOW_TIME_FORMAT).is_err()
            {
                return Err(Error::configuration(format!(
                    "{} must be an HHMMSS time, got '{}'",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
