// Serializer - turns interleaved per-test message streams into one
// stream that looks as if tests ran one at a time.

use super::{Reporter, RunOptions};
use crate::error::PipelineError;
use crate::model::{Message, SuitePath, TestPath, Time};
use anyhow::Result;
use std::collections::HashMap;
use tracing::trace;

const COMPONENT: &str = "Serializer";

/// How far a registered test has got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Registered,
    Started,
    Finished,
}

/// Messages held back for a test that is not the current one
struct Pending {
    test: TestPath,
    messages: Vec<(Message, Option<Time>)>,
}

impl Pending {
    fn is_finished(&self) -> bool {
        self.messages.last().is_some_and(|(m, _)| m.is_finish())
    }
}

/// Reorders concurrent test messages into a sequential stream.
///
/// At most one test is "current": its messages pass straight through while
/// every other test's messages are buffered. When the current test finishes,
/// the next test is chosen from the innermost suite that still has unfinished
/// tests, so a suite's tests are always reported contiguously. Already
/// finished tests win over running ones and are drained in one go.
pub struct Serializer<R> {
    reporter: R,
    registered: bool,
    tests: HashMap<TestPath, Progress>,
    remaining: HashMap<SuitePath, usize>,
    pending: Vec<Pending>,
    current: Option<TestPath>,
    last_suite: Option<SuitePath>,
}

impl<R: Reporter> Serializer<R> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            registered: false,
            tests: HashMap::new(),
            remaining: HashMap::new(),
            pending: Vec::new(),
            current: None,
            last_suite: None,
        }
    }

    pub fn inner(&self) -> &R {
        &self.reporter
    }

    pub fn into_inner(self) -> R {
        self.reporter
    }

    /// Innermost suite around the last selected test that still has
    /// unfinished tests. `None` means any pending test may go next.
    fn permissible_suite(&self) -> Option<SuitePath> {
        let mut suite = self.last_suite.clone();
        while let Some(candidate) = suite {
            if self.remaining.get(&candidate).copied().unwrap_or(0) > 0 {
                return Some(candidate);
            }
            suite = candidate.parent();
        }
        None
    }

    fn test_finished(&mut self, test: &TestPath) {
        for suite in test.suite_path().ancestors() {
            if let Some(count) = self.remaining.get_mut(&suite) {
                *count = count.saturating_sub(1);
            }
        }
    }

    /// Checks `message` against what `test` already sent and records it.
    fn advance(&mut self, test: &TestPath, message: &Message) -> Result<()> {
        let Some(progress) = self.tests.get_mut(test) else {
            return Err(PipelineError::UnknownTest {
                component: COMPONENT,
                test: test.clone(),
            }
            .into());
        };

        match (*progress, message) {
            (Progress::Finished, _) => Err(PipelineError::MessageAfterFinish {
                component: COMPONENT,
                test: test.clone(),
            }
            .into()),
            (Progress::Started, Message::Start) => Err(PipelineError::DuplicateStart {
                component: COMPONENT,
                test: test.clone(),
            }
            .into()),
            (_, Message::Start) => {
                *progress = Progress::Started;
                Ok(())
            }
            (_, Message::Finish { .. }) => {
                *progress = Progress::Finished;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Select and flush tests until one is left running or nothing is eligible.
    fn flush_next(&mut self) -> Result<()> {
        while self.current.is_none() {
            let scope = self.permissible_suite();

            let mut first = None;
            let mut finished = None;
            for (index, pending) in self.pending.iter().enumerate() {
                if scope.as_ref().is_some_and(|s| !s.contains_test(&pending.test)) {
                    continue;
                }
                first.get_or_insert(index);
                if pending.is_finished() {
                    finished = Some(index);
                    break;
                }
            }

            let Some(index) = finished.or(first) else {
                return Ok(());
            };

            let Pending { test, messages } = self.pending.remove(index);
            let done = messages.last().is_some_and(|(m, _)| m.is_finish());
            trace!(
                "serializer selected {} ({} buffered message(s), finished: {})",
                test,
                messages.len(),
                done
            );

            self.last_suite = Some(test.suite_path());
            for (message, time) in &messages {
                self.reporter.got_message(Some(&test), message, *time)?;
            }

            if done {
                self.test_finished(&test);
            } else {
                self.current = Some(test);
            }
        }
        Ok(())
    }
}

impl<R: Reporter> Reporter for Serializer<R> {
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
        let mut seen = HashMap::with_capacity(tests.len());
        for test in tests {
            if seen.insert(test.clone(), Progress::Registered).is_some() {
                return Err(PipelineError::DuplicateTest {
                    component: COMPONENT,
                    test: test.clone(),
                }
                .into());
            }
        }
        self.registered = true;
        self.tests = seen;

        for test in tests {
            for suite in test.suite_path().ancestors() {
                *self.remaining.entry(suite).or_insert(0) += 1;
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
        let Some(test) = test_path else {
            return self.reporter.got_message(None, message, time);
        };

        if !self.registered {
            return Err(PipelineError::NotRegistered {
                component: COMPONENT,
            }
            .into());
        }
        self.advance(test, message)?;

        if self.current.as_ref() == Some(test) {
            self.reporter.got_message(Some(test), message, time)?;
            if message.is_finish() {
                self.current = None;
                self.test_finished(test);
            }
        } else {
            match self.pending.iter_mut().find(|p| &p.test == test) {
                Some(pending) => pending.messages.push((message.clone(), time)),
                None => self.pending.push(Pending {
                    test: test.clone(),
                    messages: vec![(message.clone(), time)],
                }),
            }
        }

        if self.current.is_none() {
            self.flush_next()?;
        }
        Ok(())
    }

    fn done(&mut self, time: Option<Time>) -> Result<()> {
        let pending = self.pending.len() + usize::from(self.current.is_some());
        if pending > 0 {
            return Err(PipelineError::Unmatched {
                component: COMPONENT,
                pending,
            }
            .into());
        }

        self.tests.clear();
        self.remaining.clear();
        self.last_suite = None;
        self.reporter.done(time)
    }
}
