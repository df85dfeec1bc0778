//! Shared components for CLI commands
//!
//! This module contains common types, utilities, and functions used across
//! multiple CLI command implementations.

use crate::cli::args::CommonArgs;
use crate::config::Config;
use crate::{Error, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

/// Outcome of one command, used to pick the exit code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSummary {
    pub command: &'static str,
    /// Units of work that succeeded (steps, files, snapshots)
    pub succeeded: usize,
    pub total: usize,
}

impl CommandSummary {
    pub fn new(command: &'static str, succeeded: usize, total: usize) -> Self {
        Self {
            command,
            succeeded,
            total,
        }
    }

    pub fn is_success(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Set up structured logging on stderr, plus an optional log file
///
/// Expects `config` with CLI overrides applied. The returned guard flushes
/// the file writer when dropped; keep it alive until the command finishes.
pub fn setup_logging(common: &CommonArgs, config: &Config) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = config.logging.level.as_str();

    // Create filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sungrow_sync={}", log_level)));

    let (file_layer, guard) = match &config.logging.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_level(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = if common.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        // Standard logging with timestamps
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(guard)
}

fn open_log_file(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::configuration(format!("Log file path has no file name: {}", path.display()))
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| {
        Error::io(
            format!("Failed to create log directory '{}'", dir.display()),
            e,
        )
    })?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}

/// Configuration file in effect: `--config`, else the default location if it exists
pub fn resolve_config_file(common: &CommonArgs) -> Option<PathBuf> {
    match &common.config_file {
        Some(path) => Some(path.clone()),
        None => Config::default_config_path()
            .ok()
            .filter(|path| path.exists()),
    }
}

/// Load configuration using layered approach (file -> .env/env -> args)
///
/// Runs before logging is initialized, so the chosen file is reported
/// afterwards through [`log_config_source`].
pub fn load_configuration(common: &CommonArgs) -> Result<Config> {
    // A missing .env file is normal
    dotenvy::dotenv().ok();

    let config_file = resolve_config_file(common);
    let mut config = Config::load_layered(config_file.as_deref())?;

    apply_cli_overrides(&mut config, common);

    // Final validation
    config.validate()?;

    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut Config, common: &CommonArgs) {
    if let Some(log_file) = &common.log_file {
        config.logging.file = Some(log_file.clone());
    }
    if let Some(level) = common.log_level_override() {
        config.logging.level = level.to_string();
    }
}

pub fn log_config_source(common: &CommonArgs) {
    match resolve_config_file(common) {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment variables"),
    }
}

/// Print a section heading in the summary style
pub fn print_heading(title: &str) {
    println!("\n{}", title.bright_green().bold());
}

/// Print one `Label: value` summary line
pub fn print_field(label: &str, value: impl ToString) {
    println!(
        "  {} {}",
        format!("{}:", label).bright_cyan(),
        value.to_string().bright_white()
    );
}
