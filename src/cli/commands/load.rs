//! Load command implementation
//!
//! Normalizes one CSV file and upserts it into its dataset's table. The file
//! is used as given: the staging freshness check only applies to daily runs.

use super::shared::{
    CommandSummary, load_configuration, log_config_source, print_field, print_heading,
    setup_logging,
};
use crate::Result;
use crate::app::services::batch_upserter::{BatchedUpserter, UpsertSummary};
use crate::app::services::pipeline::normalize_staged_file;
use crate::app::services::staging::StagingArea;
use crate::app::services::table_store::{MemoryTableStore, RestTableStore, TableStore};
use crate::cli::args::LoadArgs;
use crate::config::Config;
use std::path::PathBuf;
use tracing::info;

/// Execute the load command
pub async fn run_load(args: LoadArgs) -> Result<CommandSummary> {
    let config = load_configuration(&args.common)?;
    let _log_guard = setup_logging(&args.common, &config)?;
    log_config_source(&args.common);

    let path = input_path(&args, &config);
    info!("Loading {} from {}", args.dataset, path.display());

    let summary = if args.dry_run {
        let store = MemoryTableStore::new();
        load_file(&store, &config, &args, path.clone()).await?
    } else {
        let store = RestTableStore::new(&config.store)?;
        load_file(&store, &config, &args, path.clone()).await?
    };

    print_heading(if args.dry_run {
        "Load Summary (dry run)"
    } else {
        "Load Summary"
    });
    print_field("File", path.display());
    print_field("Table", summary.table);
    print_field("Rows", summary.rows_written);
    print_field("Batches", summary.batches);

    Ok(CommandSummary::new("load", 1, 1))
}

/// `--file`, or the dataset's file in the staging area
pub fn input_path(args: &LoadArgs, config: &Config) -> PathBuf {
    args.file.clone().unwrap_or_else(|| {
        StagingArea::new(&config.pipeline.work_dir, true).path_for(args.dataset)
    })
}

async fn load_file(
    store: &dyn TableStore,
    config: &Config,
    args: &LoadArgs,
    path: PathBuf,
) -> Result<UpsertSummary> {
    let table = normalize_staged_file(path).await?;
    BatchedUpserter::new(store, config.pipeline.batch_size)?
        .with_progress(args.common.show_progress())
        .upsert(args.dataset, &table)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dataset;
    use crate::cli::args::CommonArgs;
    use tempfile::TempDir;

    fn load_args(file: Option<PathBuf>) -> LoadArgs {
        LoadArgs {
            common: CommonArgs::default(),
            dataset: Dataset::YieldDaily,
            file,
            dry_run: true,
        }
    }

    #[test]
    fn test_input_path_defaults_to_staging_file() {
        let mut config = Config::default();
        config.pipeline.work_dir = PathBuf::from("/srv/sungrow");

        assert_eq!(
            input_path(&load_args(None), &config),
            PathBuf::from("/srv/sungrow/yield_daily.csv")
        );
        assert_eq!(
            input_path(&load_args(Some(PathBuf::from("backfill.csv"))), &config),
            PathBuf::from("backfill.csv")
        );
    }

    #[tokio::test]
    async fn test_load_file_into_memory_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("yield.csv");
        std::fs::write(
            &path,
            "date,device,daily_yield\n20250309,INV-01,84.2\n20250310,INV-01,80.0\n",
        )
        .unwrap();
        let mut config = Config::default();
        config.pipeline.batch_size = 1;
        let store = MemoryTableStore::new();

        let summary = load_file(&store, &config, &load_args(None), path)
            .await
            .unwrap();

        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.batches, 2);
        assert_eq!(
            store.rows("yield_daily")[1]["date"],
            serde_json::json!("2025-03-10")
        );
    }
}
