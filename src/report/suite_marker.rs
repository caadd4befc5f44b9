// Suite marker - derives suiteStart/suiteFinish from test start/finish

use super::{Reporter, RunOptions};
use crate::error::PipelineError;
use crate::model::{Message, SuitePath, TestPath, Time};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

const COMPONENT: &str = "SuiteMarker";

/// Test counts under one suite, nested suites included
#[derive(Debug, Clone, Copy, Default)]
struct SuiteCount {
    total: usize,
    unstarted: usize,
    unfinished: usize,
}

/// Emits `suiteStart` before the first test of a suite starts and
/// `suiteFinish` after the last one finishes.
///
/// Only suites that are ancestors of a registered test are tracked, so
/// empty suites never produce boundary messages.
pub struct SuiteMarker<R> {
    reporter: R,
    registered: bool,
    suites: HashMap<SuitePath, SuiteCount>,
}

impl<R: Reporter> SuiteMarker<R> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            registered: false,
            suites: HashMap::new(),
        }
    }

    pub fn inner(&self) -> &R {
        &self.reporter
    }

    pub fn into_inner(self) -> R {
        self.reporter
    }

    fn check_known(&self, test: &TestPath) -> Result<()> {
        if !self.registered {
            return Err(PipelineError::NotRegistered {
                component: COMPONENT,
            }
            .into());
        }
        if !self.suites.contains_key(&test.suite_path()) {
            return Err(PipelineError::UnknownTest {
                component: COMPONENT,
                test: test.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn test_started(&mut self, test: &TestPath, time: Option<Time>) -> Result<()> {
        let mut opened = Vec::new();
        for suite in test.suite_path().ancestors() {
            if let Some(count) = self.suites.get_mut(&suite) {
                if count.unstarted == count.total {
                    opened.push(suite);
                }
                count.unstarted = count.unstarted.saturating_sub(1);
            }
        }

        // Outermost suite opens first
        for suite in opened.into_iter().rev() {
            self.reporter
                .got_message(None, &Message::SuiteStart { suite }, time)?;
        }
        Ok(())
    }

    fn test_finished(&mut self, test: &TestPath, time: Option<Time>) -> Result<()> {
        let mut closed = Vec::new();
        for suite in test.suite_path().ancestors() {
            if let Some(count) = self.suites.get_mut(&suite) {
                if count.unfinished == 0 {
                    continue;
                }
                count.unfinished -= 1;
                if count.unfinished == 0 {
                    closed.push(suite);
                }
            }
        }

        // Innermost suite closes first
        for suite in closed {
            self.reporter
                .got_message(None, &Message::SuiteFinish { suite }, time)?;
        }
        Ok(())
    }
}

impl<R: Reporter> Reporter for SuiteMarker<R> {
    fn registration_failed(&mut self, error: &anyhow::Error, time: Option<Time>) -> Result<()> {
        self.reporter.registration_failed(error, time)
    }

    fn register_tests(
        &mut self,
        tests: &[TestPath],
        options: &RunOptions,
        time: Option<Time>,
    ) -> Result<()> {
        if self.registered {
            return Err(PipelineError::AlreadyRegistered {
                component: COMPONENT,
            }
            .into());
        }
        let mut unique = HashSet::with_capacity(tests.len());
        if let Some(duplicate) = tests.iter().find(|test| !unique.insert(*test)) {
            return Err(PipelineError::DuplicateTest {
                component: COMPONENT,
                test: duplicate.clone(),
            }
            .into());
        }
        self.registered = true;

        for test in tests {
            for suite in test.suite_path().ancestors() {
                let count = self.suites.entry(suite).or_default();
                count.total += 1;
                count.unstarted += 1;
                count.unfinished += 1;
            }
        }

        self.reporter.register_tests(tests, options, time)
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        match (test_path, message) {
            (Some(test), Message::Start) => {
                self.check_known(test)?;
                self.test_started(test, time)?;
                self.reporter.got_message(test_path, message, time)
            }
            (Some(test), Message::Finish { .. }) => {
                self.check_known(test)?;
                self.reporter.got_message(test_path, message, time)?;
                self.test_finished(test, time)
            }
            _ => self.reporter.got_message(test_path, message, time),
        }
    }

    fn done(&mut self, time: Option<Time>) -> Result<()> {
        self.suites.clear();
        self.reporter.done(time)
    }
}
