//! Dataset extraction commands
//!
//! Each dataset has an external command that downloads one window of data
//! from the provider and writes `{dataset}.csv` into the work directory.

use super::process_runner::{CommandRunner, Invocation};
use crate::app::models::{Dataset, ExtractionWindow};
use crate::config::Config;
use crate::{Error, Result};
use chrono::NaiveDate;
use tracing::{error, info};

/// Wrapper around one dataset's extraction command
#[derive(Debug, Clone)]
pub struct DatasetExtractor {
    dataset: Dataset,
    base: Invocation,
}

impl DatasetExtractor {
    /// Build from the `[extraction]` section
    pub fn from_config(config: &Config, dataset: Dataset) -> Result<Self> {
        let base = Invocation::from_command(
            config.extraction.command_for(dataset),
            config.extraction.timeout(),
        )?
        .in_dir(&config.pipeline.work_dir);
        Ok(Self { dataset, base })
    }

    /// Window for `day` in this dataset's convention
    pub fn window_for(&self, config: &Config, day: NaiveDate) -> ExtractionWindow {
        ExtractionWindow::for_day(
            day,
            self.dataset.window_format(),
            &config.extraction.day_start,
            &config.extraction.day_end,
        )
    }

    /// Full invocation for a window
    pub fn invocation(&self, window: &ExtractionWindow) -> Invocation {
        self.base.clone().with_args(window.to_args())
    }

    /// Run the extraction; failures map to [`Error::Extraction`]
    pub async fn extract(
        &self,
        runner: &dyn CommandRunner,
        window: &ExtractionWindow,
    ) -> Result<()> {
        let invocation = self.invocation(window);
        info!(
            dataset = %self.dataset,
            "Running {} from {} to {}",
            invocation.command_line(),
            window.start,
            window.end
        );

        let output = runner
            .run(&invocation)
            .await
            .map_err(|e| Error::extraction(self.dataset.table_name(), e.to_string()))?;

        if output.success() {
            info!(dataset = %self.dataset, "Extraction finished");
            Ok(())
        } else {
            let reason = output.failure_summary();
            error!(dataset = %self.dataset, "Extraction failed: {}", reason);
            Err(Error::extraction(self.dataset.table_name(), reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::process_runner::ProcessOutput;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        exit_code: i32,
        seen: Mutex<Vec<Invocation>>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
            self.seen.lock().unwrap().push(invocation.clone());
            Ok(ProcessOutput {
                exit_code: Some(self.exit_code),
                ..Default::default()
            })
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.pipeline.work_dir = PathBuf::from("/srv/sungrow");
        config
    }

    #[tokio::test]
    async fn test_timestamp_window_arguments() {
        let config = config();
        let extractor = DatasetExtractor::from_config(&config, Dataset::InverterMeasures).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 10, 13).unwrap();
        let window = extractor.window_for(&config, day);
        let runner = RecordingRunner::default();

        extractor.extract(&runner, &window).await.unwrap();

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].program, "python3");
        assert_eq!(
            seen[0].args,
            vec![
                "get_inverter_measures.py",
                "--start",
                "20251013000000",
                "--end",
                "20251013235500"
            ]
        );
        assert_eq!(seen[0].working_dir, Some(PathBuf::from("/srv/sungrow")));
        assert_eq!(seen[0].timeout.as_secs(), 3600);
    }

    #[tokio::test]
    async fn test_yield_uses_date_window() {
        let config = config();
        let extractor = DatasetExtractor::from_config(&config, Dataset::YieldDaily).unwrap();
        let window = extractor.window_for(&config, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());

        let invocation = extractor.invocation(&window);
        assert_eq!(
            invocation.args,
            vec!["get_yield_daily.py", "--start", "20250102", "--end", "20250102"]
        );
    }

    #[tokio::test]
    async fn test_failure_is_extraction_error() {
        let config = config();
        let extractor = DatasetExtractor::from_config(&config, Dataset::FaultAlarms).unwrap();
        let window = extractor.window_for(&config, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        let runner = RecordingRunner {
            exit_code: 1,
            ..Default::default()
        };

        match extractor.extract(&runner, &window).await {
            Err(Error::Extraction { dataset, .. }) => assert_eq!(dataset, "fault_alarms"),
            other => panic!("Expected Extraction error, got {:?}", other),
        }
    }
}
