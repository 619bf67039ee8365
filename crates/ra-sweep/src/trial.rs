//! Sweep lifecycle and outcome tracking.

use chrono::{DateTime, Utc};
use ra_types::{RunRecord, SweepError};
use serde::{Deserialize, Serialize};

use crate::grid::GridCell;

/// Lifecycle state for a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepState {
    Pending,
    Running,
    Completed,
    /// Stopped early by the halt-on-failure policy.
    Halted,
    Failed,
}

/// Result of running one grid cell.
#[derive(Debug)]
pub enum TrialOutcome {
    Completed(RunRecord),
    Failed { cell: GridCell, error: SweepError },
}

/// Aggregate status of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepStatus {
    pub state: SweepState,
    pub planned: usize,
    pub completed: usize,
    pub failed: usize,
    /// Cells never generated because their instance file is missing.
    pub skipped: usize,
    /// Completed trial with the lowest numeric cost.
    pub best: Option<RunRecord>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SweepStatus {
    pub fn new(planned: usize, skipped: usize) -> Self {
        Self {
            state: SweepState::Pending,
            planned,
            completed: 0,
            failed: 0,
            skipped,
            best: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = SweepState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = SweepState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_halted(&mut self, reason: String) {
        self.state = SweepState::Halted;
        self.finished_at = Some(Utc::now());
        self.error = Some(reason);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = SweepState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    pub fn record_success(&mut self, record: &RunRecord) {
        self.completed += 1;
        self.update_best(record);
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Cells neither completed nor failed.
    pub fn remaining(&self) -> usize {
        self.planned.saturating_sub(self.completed + self.failed)
    }

    /// Keep `record` if its cost is numeric and lower than the current best.
    pub fn update_best(&mut self, record: &RunRecord) {
        let Some(cost) = record.numeric_cost() else {
            return;
        };
        let improves = match self.best.as_ref().and_then(RunRecord::numeric_cost) {
            None => true,
            Some(best) => cost < best,
        };
        if improves {
            self.best = Some(record.clone());
        }
    }
}
