//! Run command implementation
//!
//! Runs the daily synchronization against the configured store and prints
//! the per-step report. `--dry-run` prints the plan instead.

use super::shared::{
    CommandSummary, load_configuration, log_config_source, print_field, print_heading,
    setup_logging,
};
use crate::Result;
use crate::app::services::credential::CredentialRefresher;
use crate::app::services::extractor::DatasetExtractor;
use crate::app::services::pipeline::{
    RunOptions, RunReport, SnapshotStage, StepKind, StepOutcome, SyncPipeline, daily_plan,
};
use crate::app::services::process_runner::TokioCommandRunner;
use crate::app::services::snapshot::SnapshotOutcome;
use crate::app::services::staging::StagingArea;
use crate::app::services::table_store::RestTableStore;
use crate::cli::args::RunArgs;
use crate::config::Config;
use chrono::Local;
use colored::Colorize;
use tracing::info;

/// Execute the run command
pub async fn run_sync(args: RunArgs) -> Result<CommandSummary> {
    let config = load_configuration(&args.common)?;
    let _log_guard = setup_logging(&args.common, &config)?;
    log_config_source(&args.common);

    let options = run_options(&args, &config, Local::now().date_naive());

    if args.dry_run {
        print_plan(&config, &options)?;
        return Ok(CommandSummary::new("run", 0, 0));
    }

    let store = RestTableStore::new(&config.store)?;
    let runner = TokioCommandRunner;
    info!("Synchronizing {} into {}", options.target_day, config.store.url);

    let report = SyncPipeline::new(&config, &runner, &store)
        .with_progress(args.common.show_progress())
        .run(&options)
        .await;

    print_report(&report);

    Ok(CommandSummary::new("run", report.succeeded(), report.total()))
}

/// Resolve the target day from `--date` or the configured offset
pub fn run_options(
    args: &RunArgs,
    config: &Config,
    today: chrono::NaiveDate,
) -> RunOptions {
    let options = match args.date {
        Some(day) => RunOptions::for_day(day),
        None => RunOptions::from_today(today, config.pipeline.day_offset),
    };
    if args.no_snapshots {
        options.without_snapshots()
    } else {
        options
    }
}

/// What each plan step would do, without running anything
pub fn describe_plan(config: &Config, options: &RunOptions) -> Result<Vec<(StepKind, String)>> {
    let staging = StagingArea::new(&config.pipeline.work_dir, config.pipeline.accept_stale_inputs);

    daily_plan()
        .into_iter()
        .map(|step| -> Result<(StepKind, String)> {
            let detail = match step {
                StepKind::RefreshCredential => CredentialRefresher::from_config(config)?
                    .invocation()
                    .command_line(),
                StepKind::PrepareStaging => {
                    format!("stage files in {}", staging.work_dir().display())
                }
                StepKind::Extract(dataset) => {
                    let extractor = DatasetExtractor::from_config(config, dataset)?;
                    let window = extractor.window_for(config, options.target_day);
                    extractor.invocation(&window).command_line()
                }
                StepKind::Load(dataset) => format!(
                    "{} -> {} (key: {})",
                    staging.path_for(dataset).display(),
                    dataset.table_name(),
                    dataset.natural_key().join(", ")
                ),
            };
            Ok((step, detail))
        })
        .collect()
}

fn print_plan(config: &Config, options: &RunOptions) -> Result<()> {
    let plan = describe_plan(config, options)?;

    print_heading("Dry Run");
    print_field("Target day", options.target_day);
    print_field("Store", display_or_unset(&config.store.url));
    print_field("Batch size", config.pipeline.batch_size);

    println!();
    for (index, (step, detail)) in plan.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("[{}/{}]", index + 1, plan.len()).bright_cyan(),
            step.to_string().bright_white(),
            detail.dimmed()
        );
    }

    println!();
    if options.snapshots && config.pipeline.snapshots_enabled {
        print_field(
            "Snapshots",
            format!(
                "{} into {} after a clean run",
                options.snapshot_year,
                config.pipeline.archive_dir.display()
            ),
        );
    } else {
        print_field("Snapshots", "disabled");
    }
    Ok(())
}

fn display_or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "(not set)".to_string()
    } else {
        value.to_string()
    }
}

/// Print the synchronization summary
fn print_report(report: &RunReport) {
    print_heading("Synchronization Summary");
    print_field("Target day", report.target_day);

    println!();
    for record in &report.steps {
        match &record.outcome {
            StepOutcome::Succeeded { detail } => println!(
                "  {} {} {}",
                "✓".bright_green(),
                record.step.to_string().bright_white(),
                detail.dimmed()
            ),
            StepOutcome::Failed { reason } => println!(
                "  {} {} {}",
                "✗".bright_red(),
                record.step.to_string().bright_white(),
                reason.red()
            ),
            StepOutcome::NotAttempted => println!(
                "  {} {}",
                "-".dimmed(),
                record.step.to_string().dimmed()
            ),
        }
    }

    println!();
    let tally = format!("{}/{} steps succeeded", report.succeeded(), report.total());
    if report.all_succeeded() {
        print_field("Result", tally);
    } else {
        println!(
            "  {} {}",
            "Result:".bright_cyan(),
            format!("{} ({})", tally, report.verdict()).bright_red().bold()
        );
    }

    match &report.snapshot_stage {
        SnapshotStage::Skipped => print_field("Snapshots", "skipped (run not clean)"),
        SnapshotStage::Disabled => print_field("Snapshots", "disabled"),
        SnapshotStage::Completed(records) => {
            let failed = records.iter().filter(|r| !r.is_success()).count();
            print_field(
                "Snapshots",
                format!("{}/{} succeeded", records.len() - failed, records.len()),
            );
            for record in records {
                match &record.outcome {
                    Ok(SnapshotOutcome::Written { path, rows }) => println!(
                        "    {} {} rows -> {}",
                        "✓".bright_green(),
                        rows,
                        path.display()
                    ),
                    Ok(SnapshotOutcome::NoData) => println!(
                        "    {} {} {}: no data",
                        "-".dimmed(),
                        record.dataset,
                        record.year
                    ),
                    Err(reason) => println!(
                        "    {} {} {}: {}",
                        "✗".bright_red(),
                        record.dataset,
                        record.year,
                        reason.red()
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataset;
    use crate::cli::args::CommonArgs;
    use chrono::NaiveDate;

    fn run_args(date: Option<NaiveDate>, no_snapshots: bool) -> RunArgs {
        RunArgs {
            common: CommonArgs::default(),
            date,
            no_snapshots,
            dry_run: true,
        }
    }

    #[test]
    fn test_default_day_uses_configured_offset() {
        let mut config = Config::default();
        config.pipeline.day_offset = 3;
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();

        let options = run_options(&run_args(None, false), &config, today);

        assert_eq!(options.target_day, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert!(options.snapshots);
    }

    #[test]
    fn test_explicit_date_wins() {
        let config = Config::default();
        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();

        let options = run_options(&run_args(Some(day), true), &config, today);

        assert_eq!(options.target_day, day);
        assert_eq!(options.snapshot_year, 2024);
        assert!(!options.snapshots);
    }

    #[test]
    fn test_describe_plan() {
        let config = Config::default();
        let options = RunOptions::for_day(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());

        let plan = describe_plan(&config, &options).unwrap();

        assert_eq!(plan.len(), 10);
        assert_eq!(plan[0].1, "python3 login_script.py");
        let (step, detail) = &plan[4];
        assert_eq!(*step, StepKind::Extract(Dataset::YieldDaily));
        assert_eq!(
            detail,
            "python3 get_yield_daily.py --start 20250309 --end 20250309"
        );
        assert!(plan[9].1.contains("fault_alarms.csv -> fault_alarms"));
    }
}
