//! Command implementations for the CLI
//!
//! Each subcommand lives in its own module; [`run`] dispatches parsed
//! arguments to the matching implementation.

pub mod load;
pub mod shared;
pub mod snapshot;
pub mod sync;

pub use shared::CommandSummary;

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};

/// Main entry point for command execution
pub async fn run(args: Args) -> Result<CommandSummary> {
    match args.command {
        Some(Commands::Run(run_args)) => sync::run_sync(run_args).await,
        Some(Commands::Load(load_args)) => load::run_load(load_args).await,
        Some(Commands::Snapshot(snapshot_args)) => snapshot::run_snapshot(snapshot_args).await,
        None => Err(Error::configuration("No command specified")),
    }
}
