//! Declarative step plan and run accounting

use crate::app::models::Dataset;
use crate::app::services::snapshot::SnapshotRecord;
use chrono::{Datelike, Days, NaiveDate};
use std::fmt;

/// One independently failable step of the daily run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    RefreshCredential,
    PrepareStaging,
    Extract(Dataset),
    Load(Dataset),
}

impl StepKind {
    /// A failed fatal step aborts the run; nothing after it is attempted
    pub fn is_fatal(&self) -> bool {
        matches!(self, StepKind::RefreshCredential)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::RefreshCredential => f.write_str("refresh credential"),
            StepKind::PrepareStaging => f.write_str("prepare staging area"),
            StepKind::Extract(dataset) => write!(f, "extract {}", dataset.label()),
            StepKind::Load(dataset) => write!(f, "load {}", dataset.label()),
        }
    }
}

/// The daily plan: credential, staging, four extractions, four loads
pub fn daily_plan() -> Vec<StepKind> {
    let mut plan = vec![StepKind::RefreshCredential, StepKind::PrepareStaging];
    plan.extend(Dataset::ALL.map(StepKind::Extract));
    plan.extend(Dataset::ALL.map(StepKind::Load));
    plan
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded { detail: String },
    Failed { reason: String },
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: StepKind,
    pub outcome: StepOutcome,
}

impl StepRecord {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, StepOutcome::Succeeded { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Failed { .. })
    }
}

/// What happened to the snapshot stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStage {
    /// Some plan step did not succeed
    Skipped,
    /// Turned off by configuration or flag
    Disabled,
    Completed(Vec<SnapshotRecord>),
}

/// Terminal verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    Done,
    DoneWithFailures,
    Aborted,
}

impl fmt::Display for RunVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunVerdict::Done => f.write_str("done"),
            RunVerdict::DoneWithFailures => f.write_str("done with failures"),
            RunVerdict::Aborted => f.write_str("aborted"),
        }
    }
}

/// Per-step outcomes of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub target_day: NaiveDate,
    pub steps: Vec<StepRecord>,
    pub snapshot_stage: SnapshotStage,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|s| s.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.iter().filter(|s| s.failed()).count()
    }

    pub fn attempted(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome != StepOutcome::NotAttempted)
            .count()
    }

    /// Every plan step succeeded
    pub fn all_succeeded(&self) -> bool {
        !self.steps.is_empty() && self.succeeded() == self.total()
    }

    pub fn verdict(&self) -> RunVerdict {
        if self.steps.iter().any(|s| s.step.is_fatal() && s.failed()) {
            RunVerdict::Aborted
        } else if self.all_succeeded() {
            RunVerdict::Done
        } else {
            RunVerdict::DoneWithFailures
        }
    }

    /// Process exit code carrying the verdict
    pub fn exit_code(&self) -> i32 {
        match self.verdict() {
            RunVerdict::Done => 0,
            _ => 1,
        }
    }
}

/// Parameters of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Day whose data is extracted
    pub target_day: NaiveDate,
    /// Year regenerated by the snapshot stage
    pub snapshot_year: i32,
    pub snapshots: bool,
}

impl RunOptions {
    /// Synchronize `day`; snapshots cover the day's year
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            target_day: day,
            snapshot_year: day.year(),
            snapshots: true,
        }
    }

    /// Synchronize the day `offset` days before `today`
    pub fn from_today(today: NaiveDate, offset: u32) -> Self {
        let day = today
            .checked_sub_days(Days::new(u64::from(offset)))
            .unwrap_or(today);
        Self::for_day(day)
    }

    pub fn without_snapshots(mut self) -> Self {
        self.snapshots = false;
        self
    }
}
