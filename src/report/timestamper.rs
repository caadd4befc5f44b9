// Timestamper - fills in hook times the caller left out

use super::{Capabilities, Reporter, RunOptions};
use crate::model::{Message, TestPath, Time};
use crate::time::{Clock, SystemClock};
use anyhow::Result;

/// Stamps each hook with the clock's time unless a time was already given.
pub struct Timestamper<R, C = SystemClock> {
    reporter: R,
    clock: C,
}

impl<R: Reporter> Timestamper<R, SystemClock> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            clock: SystemClock,
        }
    }
}

impl<R: Reporter, C: Clock> Timestamper<R, C> {
    pub fn with_clock(reporter: R, clock: C) -> Self {
        Self { reporter, clock }
    }

    pub fn inner(&self) -> &R {
        &self.reporter
    }

    pub fn into_inner(self) -> R {
        self.reporter
    }

    fn stamp(&self, time: Option<Time>) -> Option<Time> {
        Some(time.unwrap_or_else(|| self.clock.now()))
    }
}

impl<R: Reporter, C: Clock> Reporter for Timestamper<R, C> {
    fn capabilities(&self) -> Capabilities {
        self.reporter.capabilities()
    }

    fn registration_failed(&mut self, error: &anyhow::Error, time: Option<Time>) -> Result<()> {
        let time = self.stamp(time);
        self.reporter.registration_failed(error, time)
    }

    fn register_tests(
        &mut self,
        tests: &[TestPath],
        options: &RunOptions,
        time: Option<Time>,
    ) -> Result<()> {
        let time = self.stamp(time);
        self.reporter.register_tests(tests, options, time)
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        let time = self.stamp(time);
        self.reporter.got_message(test_path, message, time)
    }

    fn done(&mut self, time: Option<Time>) -> Result<()> {
        let time = self.stamp(time);
        self.reporter.done(time)
    }
}
