use clap::Parser;
use sungrow_sync::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to install CTRL+C signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        // Dropping the command future kills any running child process
        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, stopping synchronization...");
                Err(sungrow_sync::Error::processing_interrupted(
                    "Synchronization interrupted by user",
                ))
            }
        }
    });

    match result {
        Ok(summary) if summary.is_success() => process::exit(0),
        Ok(summary) => {
            eprintln!(
                "{}: {}/{} succeeded",
                summary.command, summary.succeeded, summary.total
            );
            process::exit(1);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Sungrow Sync - Daily Plant Telemetry Synchronization");
    println!("====================================================");
    println!();
    println!("Pull one day of Sungrow inverter, combiner, yield and fault alarm data");
    println!("through the provider scripts and upsert it into a Supabase table store.");
    println!();
    println!("USAGE:");
    println!("    sungrow-sync <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    run         Run the daily synchronization (main command)");
    println!("    load        Normalize and upsert one local CSV file");
    println!("    snapshot    Regenerate annual CSV snapshots from the store");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("ENVIRONMENT:");
    println!("    SUPABASE_URL, SUPABASE_ANON_KEY    Remote store location and key");
    println!();
    println!("EXAMPLES:");
    println!("    # Synchronize the default day (today minus the configured offset):");
    println!("    sungrow-sync run");
    println!();
    println!("    # Backfill one day without touching the snapshots:");
    println!("    sungrow-sync run --date 2025-03-09 --no-snapshots");
    println!();
    println!("    # Reload a staged file by hand:");
    println!("    sungrow-sync load inverter_measures --file inverter_measures.csv");
    println!();
    println!("    # Rebuild last year's snapshots:");
    println!("    sungrow-sync snapshot --year 2024");
    println!();
    println!("For detailed help on any command, use:");
    println!("    sungrow-sync <COMMAND> --help");
}
