//! Scenario tests for the daily pipeline
//!
//! A scripted command runner stands in for the login and extraction
//! scripts: each script either exits cleanly or fails, and may leave a CSV
//! file in the work directory like the real extraction commands do.

use crate::app::models::{Dataset, Row};
use crate::app::services::process_runner::{CommandRunner, Invocation, ProcessOutput};
use crate::app::services::table_store::{MemoryTableStore, RangeFilter, TableStore};
use crate::{Error, Result};
use crate::config::Config;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;


/// Behavior of one scripted command
#[derive(Debug, Clone)]
pub struct Script {
    pub exit_code: i32,
    /// File name and content written into the working directory
    pub output: Option<(String, String)>,
}

/// Command runner keyed by script name (first argument)
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    /// Every command succeeds and every extraction writes a valid file
    pub fn all_succeeding() -> Self {
        let mut runner = Self::default();
        runner.set("login_script.py", Script { exit_code: 0, output: None });
        for dataset in Dataset::ALL {
            runner.set_extraction(dataset, 0, Some(sample_csv(dataset)));
        }
        runner
    }

    pub fn set(&mut self, script: &str, behavior: Script) {
        self.scripts.insert(script.to_string(), behavior);
    }

    pub fn set_extraction(&mut self, dataset: Dataset, exit_code: i32, csv: Option<String>) {
        self.set(
            &script_for(dataset),
            Script {
                exit_code,
                output: csv.map(|content| (dataset.staging_file_name(), content)),
            },
        );
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let script = invocation.args.first().cloned().unwrap_or_default();
        let behavior = self.scripts.get(&script).cloned().unwrap_or(Script {
            exit_code: 127,
            output: None,
        });

        if let (Some((name, content)), Some(dir)) = (&behavior.output, &invocation.working_dir) {
            std::fs::write(dir.join(name), content).unwrap();
        }

        Ok(ProcessOutput {
            exit_code: Some(behavior.exit_code),
            stdout: String::new(),
            stderr: if behavior.exit_code == 0 {
                String::new()
            } else {
                format!("{} failed", script)
            },
        })
    }
}

/// Accepts writes but cannot read anything back
#[derive(Default)]
pub struct WriteOnlyStore {
    pub inner: MemoryTableStore,
}

#[async_trait]
impl TableStore for WriteOnlyStore {
    async fn select_range(&self, _: &str, _: &RangeFilter, _: &[&str]) -> Result<Vec<Row>> {
        Err(Error::store(503, "read replica unavailable"))
    }

    async fn count(&self, _: &str, _: Option<&RangeFilter>) -> Result<u64> {
        Err(Error::store(503, "read replica unavailable"))
    }

    async fn upsert(&self, table: &str, conflict_key: &[&str], rows: &[Row]) -> Result<()> {
        self.inner.upsert(table, conflict_key, rows).await
    }
}

pub fn script_for(dataset: Dataset) -> String {
    format!("get_{}.py", dataset.table_name())
}

/// Two rows for the target day in each dataset's raw layout
pub fn sample_csv(dataset: Dataset) -> String {
    match dataset {
        Dataset::YieldDaily => {
            "date,device,daily_yield\n20250309,INV-01,84.2\n20250309,INV-02,79.9\n".to_string()
        }
        _ => {
            "timestamp,device,value\n2025-03-09T10:00:00,DEV-01,1.5\n2025-03-09 10:05,DEV-01,\n"
                .to_string()
        }
    }
}

pub fn target_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
}

/// Configuration pointing the work and archive directories into `temp_dir`
pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.pipeline.work_dir = temp_dir.path().join("work");
    config.pipeline.archive_dir = temp_dir.path().join("archive");
    std::fs::create_dir_all(&config.pipeline.work_dir).unwrap();
    config
}

pub fn archive_files(config: &Config) -> Vec<PathBuf> {
    std::fs::read_dir(&config.pipeline.archive_dir)
        .map(|entries| entries.map(|e| e.unwrap().path()).collect())
        .unwrap_or_default()
}
