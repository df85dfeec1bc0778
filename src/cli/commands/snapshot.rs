//! Snapshot command implementation

use super::shared::{
    CommandSummary, load_configuration, log_config_source, print_field, print_heading,
    setup_logging,
};
use crate::Result;
use crate::app::services::pipeline::RunOptions;
use crate::app::services::snapshot::{SnapshotGenerator, SnapshotOutcome, SnapshotRecord};
use crate::app::services::table_store::RestTableStore;
use crate::cli::args::SnapshotArgs;
use crate::config::Config;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use tracing::info;

/// Execute the snapshot command
pub async fn run_snapshot(args: SnapshotArgs) -> Result<CommandSummary> {
    let config = load_configuration(&args.common)?;
    let _log_guard = setup_logging(&args.common, &config)?;
    log_config_source(&args.common);

    let year = snapshot_year(&args, &config, Local::now().date_naive());
    let datasets = args.selected_datasets();
    info!("Generating {} snapshots for {} datasets", year, datasets.len());

    let store = RestTableStore::new(&config.store)?;
    let records = SnapshotGenerator::new(&store, &config.pipeline.archive_dir)
        .generate_all(&datasets, year)
        .await;

    print_records(year, &records);

    let succeeded = records.iter().filter(|r| r.is_success()).count();
    Ok(CommandSummary::new("snapshot", succeeded, records.len()))
}

/// `--year`, else the year of the day a scheduled run would synchronize
pub fn snapshot_year(args: &SnapshotArgs, config: &Config, today: NaiveDate) -> i32 {
    args.year
        .unwrap_or_else(|| RunOptions::from_today(today, config.pipeline.day_offset).snapshot_year)
}

fn print_records(year: i32, records: &[SnapshotRecord]) {
    print_heading("Snapshot Summary");
    print_field("Year", year);

    for record in records {
        match &record.outcome {
            Ok(SnapshotOutcome::Written { path, rows }) => print_field(
                record.dataset.table_name(),
                format!("{} rows -> {}", rows, path.display()),
            ),
            Ok(SnapshotOutcome::NoData) => print_field(record.dataset.table_name(), "no data"),
            Err(reason) => println!(
                "  {} {}",
                format!("{}:", record.dataset).bright_cyan(),
                reason.bright_red().bold()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::CommonArgs;

    fn snapshot_args(year: Option<i32>) -> SnapshotArgs {
        SnapshotArgs {
            common: CommonArgs::default(),
            year,
            datasets: Vec::new(),
        }
    }

    #[test]
    fn test_year_defaults_to_sync_day_year() {
        let config = Config::default();
        let new_year = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let spring = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();

        assert_eq!(snapshot_year(&snapshot_args(None), &config, new_year), 2024);
        assert_eq!(snapshot_year(&snapshot_args(None), &config, spring), 2025);
        assert_eq!(snapshot_year(&snapshot_args(Some(2021)), &config, spring), 2021);
    }

    #[test]
    fn test_all_datasets_selected_by_default() {
        assert_eq!(snapshot_args(None).selected_datasets().len(), 4);
    }
}
