//! Command-line argument definitions for Sungrow Sync
//!
//! This module defines the CLI using the clap derive API. Every subcommand
//! flattens [`CommonArgs`] for configuration, logging and progress flags.

use crate::app::models::Dataset;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the Sungrow synchronization job
///
/// Pulls daily plant telemetry through the provider extraction scripts and
/// upserts it into a Supabase table store, then archives full years as CSV.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sungrow-sync",
    version,
    about = "Synchronize Sungrow plant telemetry into a Supabase table store",
    long_about = "Runs the daily Sungrow synchronization: renews the provider credential, \
                  extracts inverter, combiner, yield and fault alarm data for one day, \
                  normalizes and upserts every dataset by its natural key, and regenerates \
                  the annual CSV snapshots after a fully successful run."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the daily synchronization pipeline
    Run(RunArgs),
    /// Normalize and upsert one local CSV file
    Load(LoadArgs),
    /// Regenerate annual snapshots from the remote store
    Snapshot(SnapshotArgs),
}

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CommonArgs {
    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// ~/.config/sungrow-sync/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long = "log-file", value_name = "FILE", help = "Also write logs to FILE")]
    pub log_file: Option<PathBuf>,

    /// Show progress bars while uploading
    #[arg(long = "progress", help = "Show progress bars while uploading batches")]
    pub progress: bool,
}

/// Arguments for the run command (daily pipeline)
#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Day to synchronize (YYYY-MM-DD)
    ///
    /// Defaults to today minus the configured day offset. Use to backfill.
    #[arg(long = "date", value_name = "YYYY-MM-DD", help = "Day to synchronize")]
    pub date: Option<NaiveDate>,

    /// Skip the annual snapshot stage
    #[arg(long = "no-snapshots", help = "Skip annual snapshots after the run")]
    pub no_snapshots: bool,

    /// Print the plan without running anything
    #[arg(
        long = "dry-run",
        help = "Show the steps and extraction windows without running them"
    )]
    pub dry_run: bool,
}

/// Arguments for the load command
#[derive(Debug, Clone, Parser)]
pub struct LoadArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Dataset the file belongs to
    #[arg(
        value_name = "DATASET",
        help = "inverter_measures, combiner_measures, yield_daily or fault_alarms"
    )]
    pub dataset: Dataset,

    /// CSV file to load (defaults to the dataset's staging file)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Normalize and batch without writing to the store
    #[arg(long = "dry-run", help = "Normalize and batch without writing to the store")]
    pub dry_run: bool,
}

/// Arguments for the snapshot command
#[derive(Debug, Clone, Parser)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Year to snapshot (defaults to the year of the current sync day)
    #[arg(long = "year", value_name = "YEAR")]
    pub year: Option<i32>,

    /// Datasets to snapshot; repeat for several (default: all)
    #[arg(short = 'd', long = "dataset", value_name = "DATASET")]
    pub datasets: Vec<Dataset>,
}

impl CommonArgs {
    /// Log level forced by `-v`/`-q`; `None` keeps the configured level
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else {
            match self.verbose {
                0 => None,
                1 => Some("debug"),
                _ => Some("trace"),
            }
        }
    }

    /// Check if we should show progress bars
    pub fn show_progress(&self) -> bool {
        self.progress && !self.quiet
    }
}

impl SnapshotArgs {
    /// Requested datasets without duplicates, all of them when none given
    pub fn selected_datasets(&self) -> Vec<Dataset> {
        if self.datasets.is_empty() {
            return Dataset::ALL.to_vec();
        }
        let mut datasets = self.datasets.clone();
        datasets.sort();
        datasets.dedup();
        datasets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let args = Args::try_parse_from([
            "sungrow-sync",
            "run",
            "--date",
            "2025-03-09",
            "--no-snapshots",
            "-vv",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Run(run)) => {
                assert_eq!(run.date, NaiveDate::from_ymd_opt(2025, 3, 9));
                assert!(run.no_snapshots);
                assert!(!run.dry_run);
                assert_eq!(run.common.log_level_override(), Some("trace"));
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(Args::try_parse_from(["sungrow-sync", "run", "--date", "09/03/2025"]).is_err());
    }

    #[test]
    fn test_load_args() {
        let args = Args::try_parse_from([
            "sungrow-sync",
            "load",
            "inverter_measures",
            "--file",
            "/tmp/inverters.csv",
            "--progress",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Load(load)) => {
                assert_eq!(load.dataset, Dataset::InverterMeasures);
                assert_eq!(load.file, Some(PathBuf::from("/tmp/inverters.csv")));
                assert!(load.common.show_progress());
            }
            other => panic!("Expected load command, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_dataset_rejected() {
        assert!(Args::try_parse_from(["sungrow-sync", "load", "devices"]).is_err());
    }

    #[test]
    fn test_snapshot_datasets() {
        let args = Args::try_parse_from([
            "sungrow-sync",
            "snapshot",
            "--year",
            "2024",
            "-d",
            "yield_daily",
            "-d",
            "yield-daily",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Snapshot(snapshot)) => {
                assert_eq!(snapshot.year, Some(2024));
                assert_eq!(snapshot.selected_datasets(), vec![Dataset::YieldDaily]);
            }
            other => panic!("Expected snapshot command, got {:?}", other),
        }
    }

    #[test]
    fn test_quiet_and_progress() {
        let common = CommonArgs {
            quiet: true,
            progress: true,
            ..Default::default()
        };
        assert_eq!(common.log_level_override(), Some("error"));
        assert!(!common.show_progress());
        assert_eq!(CommonArgs::default().log_level_override(), None);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["sungrow-sync", "run", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_no_command() {
        let args = Args::try_parse_from(["sungrow-sync"]).unwrap();
        assert!(args.command.is_none());
    }
}
