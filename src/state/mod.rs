// State module - outcome totals for a run

use crate::model::TestOutcome;
use serde::Serialize;

/// Outcome counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    passed: usize,
    failed: usize,
    skipped: usize,
    timed_out: usize,
    aborted: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished test
    pub fn add(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Success => self.passed += 1,
            TestOutcome::Failure => self.failed += 1,
            TestOutcome::Skipped => self.skipped += 1,
            TestOutcome::Timeout => self.timed_out += 1,
            TestOutcome::Aborted => self.aborted += 1,
        }
    }

    pub fn count(&self, outcome: TestOutcome) -> usize {
        match outcome {
            TestOutcome::Success => self.passed,
            TestOutcome::Failure => self.failed,
            TestOutcome::Skipped => self.skipped,
            TestOutcome::Timeout => self.timed_out,
            TestOutcome::Aborted => self.aborted,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.timed_out + self.aborted
    }

    /// True when nothing failed, timed out or was aborted
    pub fn all_passed(&self) -> bool {
        self.failed + self.timed_out + self.aborted == 0
    }

    pub fn pass_rate(&self) -> f64 {
        let executed = self.total() - self.skipped;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }
}
