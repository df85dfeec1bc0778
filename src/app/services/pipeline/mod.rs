//! Daily synchronization pipeline
//!
//! Executes the declarative [`daily_plan`] one step at a time and records a
//! typed outcome for every step:
//!
//! 1. Renew the provider credential (fatal on failure)
//! 2. Prepare the staging area
//! 3. Run the four extraction commands for the target day
//! 4. Normalize and upsert each dataset's staged file
//!
//! Failures other than the credential are recorded and the run continues.
//! When every step succeeded the annual snapshots are regenerated.

pub mod plan;

#[cfg(test)]
pub mod tests;

pub use plan::{
    RunOptions, RunReport, RunVerdict, SnapshotStage, StepKind, StepOutcome, StepRecord,
    daily_plan,
};

use super::batch_upserter::BatchedUpserter;
use super::credential::CredentialRefresher;
use super::extractor::DatasetExtractor;
use super::normalizer;
use super::process_runner::CommandRunner;
use super::snapshot::SnapshotGenerator;
use super::staging::StagingArea;
use super::table_store::TableStore;
use crate::app::models::{Dataset, Table};
use crate::config::Config;
use crate::{Error, Result};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Normalize a staged file on the blocking pool
pub async fn normalize_staged_file(path: PathBuf) -> Result<Table> {
    let label = path.display().to_string();
    tokio::task::spawn_blocking(move || normalizer::normalize_file(&path))
        .await
        .map_err(|e| Error::normalization(label, format!("normalizer task failed: {}", e)))?
}

/// Orchestrates one daily run against a command runner and a table store
pub struct SyncPipeline<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    store: &'a dyn TableStore,
    show_progress: bool,
}

impl<'a> SyncPipeline<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        store: &'a dyn TableStore,
    ) -> Self {
        Self {
            config,
            runner,
            store,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Run every plan step, then the snapshot stage when the run was clean
    pub async fn run(&self, options: &RunOptions) -> RunReport {
        let plan = daily_plan();
        let total = plan.len();
        let mut staging = StagingArea::new(
            &self.config.pipeline.work_dir,
            self.config.pipeline.accept_stale_inputs,
        );

        info!(
            "Starting synchronization for {} ({} steps)",
            options.target_day, total
        );

        let mut steps = Vec::with_capacity(total);
        let mut aborted = false;
        for (index, step) in plan.into_iter().enumerate() {
            if aborted {
                steps.push(StepRecord {
                    step,
                    outcome: StepOutcome::NotAttempted,
                });
                continue;
            }

            info!("[{}/{}] {}", index + 1, total, step);
            let outcome = match self.execute(step, options, &mut staging).await {
                Ok(detail) => {
                    info!("✓ {}: {}", step, detail);
                    StepOutcome::Succeeded { detail }
                }
                Err(e) => {
                    error!("✗ {}: {}", step, e);
                    if step.is_fatal() {
                        error!("Aborting run: {} is required", step);
                        aborted = true;
                    }
                    StepOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            steps.push(StepRecord { step, outcome });
        }

        let mut report = RunReport {
            target_day: options.target_day,
            steps,
            snapshot_stage: SnapshotStage::Skipped,
        };
        info!(
            "Synchronization {}: {}/{} steps succeeded",
            report.verdict(),
            report.succeeded(),
            report.total()
        );

        report.snapshot_stage = self.snapshot_stage(&report, options).await;
        report
    }

    async fn snapshot_stage(&self, report: &RunReport, options: &RunOptions) -> SnapshotStage {
        if !report.all_succeeded() {
            warn!(
                "Skipping annual snapshots: {}/{} steps succeeded",
                report.succeeded(),
                report.total()
            );
            return SnapshotStage::Skipped;
        }
        if !options.snapshots || !self.config.pipeline.snapshots_enabled {
            info!("Annual snapshots disabled");
            return SnapshotStage::Disabled;
        }

        info!("Generating {} snapshots", options.snapshot_year);
        let generator = SnapshotGenerator::new(self.store, &self.config.pipeline.archive_dir);
        SnapshotStage::Completed(
            generator
                .generate_all(&Dataset::ALL, options.snapshot_year)
                .await,
        )
    }

    async fn execute(
        &self,
        step: StepKind,
        options: &RunOptions,
        staging: &mut StagingArea,
    ) -> Result<String> {
        match step {
            StepKind::RefreshCredential => {
                CredentialRefresher::from_config(self.config)?
                    .refresh(self.runner)
                    .await?;
                Ok("credential renewed".to_string())
            }
            StepKind::PrepareStaging => {
                let prepared = staging.prepare_all()?;
                Ok(format!(
                    "{} datasets staged in {}",
                    prepared,
                    staging.work_dir().display()
                ))
            }
            StepKind::Extract(dataset) => {
                let extractor = DatasetExtractor::from_config(self.config, dataset)?;
                let window = extractor.window_for(self.config, options.target_day);
                extractor.extract(self.runner, &window).await?;
                Ok(format!("window {}", window))
            }
            StepKind::Load(dataset) => self.load(dataset, staging).await,
        }
    }

    async fn load(&self, dataset: Dataset, staging: &StagingArea) -> Result<String> {
        let path = staging.input_for_load(dataset)?;
        let table = normalize_staged_file(path).await?;

        let summary = BatchedUpserter::new(self.store, self.config.pipeline.batch_size)?
            .with_progress(self.show_progress)
            .upsert(dataset, &table)
            .await?;

        if summary.rows_written == 0 {
            Ok("no rows to insert".to_string())
        } else {
            Ok(format!(
                "{} rows in {} batches",
                summary.rows_written, summary.batches
            ))
        }
    }
}
