// Suite runner
// Discovers tests, runs them with bounded parallelism and feeds their
// messages through a reporter one at a time.

use super::discovery::{TestDiscovery, TestSpec, flatten_suite};
use super::executor::{Envelope, MessageSink, TestExecutor};
use crate::model::{ErrorLocation, Message, TestOutcome, TestPath};
use crate::report::{Reporter, RunOptions};
use crate::state::RunSummary;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 1024;
pub const DEFAULT_TIMEOUT_GRACE_MS: u64 = 500;

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub parallelism: usize,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// How long a timed out attempt may keep reporting before it is dropped
    pub timeout_grace: Duration,
    /// Total attempts per test, at least 1
    pub attempts: u32,
    pub slow_threshold: Duration,
    /// Only run tests whose path matches
    pub grep: Option<Regex>,
    /// Run the tests `grep` does not match instead
    pub invert: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        let defaults = RunOptions::default();
        Self {
            parallelism: defaults.parallelism,
            timeout: Duration::from_millis(defaults.timeout_ms),
            timeout_grace: Duration::from_millis(DEFAULT_TIMEOUT_GRACE_MS),
            attempts: defaults.attempts,
            slow_threshold: Duration::from_millis(defaults.slow_threshold_ms),
            grep: None,
            invert: false,
        }
    }
}

impl RunnerOptions {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            parallelism: self.parallelism,
            timeout_ms: self.timeout.as_millis() as u64,
            attempts: self.attempts,
            slow_threshold_ms: self.slow_threshold.as_millis() as u64,
        }
    }

    fn selects(&self, test: &TestPath) -> bool {
        match &self.grep {
            Some(grep) => grep.is_match(&test.path.join(" ")) != self.invert,
            None => true,
        }
    }
}

/// Cancels a run from outside; unfinished tests finish as `aborted`.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Drives a whole run.
pub struct SuiteRunner<D, E> {
    discovery: D,
    executor: Arc<E>,
    options: RunnerOptions,
    cancel: CancelHandle,
}

impl<D: TestDiscovery, E: TestExecutor> SuiteRunner<D, E> {
    pub fn new(discovery: D, executor: E, options: RunnerOptions) -> Self {
        Self {
            discovery,
            executor: Arc::new(executor),
            options,
            cancel: CancelHandle::new(),
        }
    }

    /// Handle that aborts this runner's runs
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    async fn discover(&self, files: &[PathBuf]) -> Result<Vec<TestSpec>> {
        let mut specs = Vec::new();
        for file in files {
            let root = self.discovery.list_tests(file).await?;
            let file_name = file.to_string_lossy();
            specs.extend(
                flatten_suite(&file_name, &root)
                    .into_iter()
                    .filter(|spec| self.options.selects(&spec.path)),
            );
        }

        let mut unique = HashSet::with_capacity(specs.len());
        if let Some(duplicate) = specs.iter().find(|spec| !unique.insert(&spec.path)) {
            anyhow::bail!("Duplicate test name: {}", duplicate.path);
        }
        Ok(specs)
    }

    /// Runs every test in `files`, reporting through `reporter`.
    ///
    /// Discovery failures are reported via `registration_failed` and returned.
    /// Test failures are not errors; they show up in the summary.
    pub async fn run<R: Reporter>(
        &self,
        files: &[PathBuf],
        reporter: &mut R,
    ) -> Result<RunSummary> {
        let run_start = Instant::now();

        let specs = match self.discover(files).await {
            Ok(specs) => specs,
            Err(error) => {
                warn!("Test discovery failed: {:#}", error);
                reporter.registration_failed(&error, None)?;
                return Err(error);
            }
        };

        let paths: Vec<TestPath> = specs.iter().map(|s| s.path.clone()).collect();
        info!(
            "Running {} test(s) from {} file(s) (parallelism: {})",
            paths.len(),
            files.len(),
            self.options.parallelism
        );
        reporter.register_tests(&paths, &self.options.run_options(), None)?;

        let (tx, mut rx) = mpsc::channel::<Envelope>(CHANNEL_CAPACITY);
        let parallelism = self.options.parallelism.max(1);

        let producer = async move {
            stream::iter(specs)
                .map(|spec| {
                    let sink = MessageSink::new(spec.path.clone(), tx.clone());
                    async move { self.run_one(spec, sink).await }
                })
                .buffer_unordered(parallelism)
                .collect::<Vec<()>>()
                .await;
            // `tx` is dropped here, which ends the consumer loop
            Ok::<_, anyhow::Error>(())
        };

        let mut summary = RunSummary::new();
        let consumer = async {
            while let Some(envelope) = rx.recv().await {
                if let Some(outcome) = envelope.message.outcome() {
                    summary.add(outcome);
                }
                reporter.got_message(
                    Some(&envelope.test),
                    &envelope.message,
                    Some(envelope.time),
                )?;
            }
            Ok::<_, anyhow::Error>(())
        };

        tokio::try_join!(producer, consumer)?;

        reporter.done(None)?;
        summary.duration_ms = run_start.elapsed().as_millis() as u64;
        info!(
            "Run finished in {}ms ({} test(s))",
            summary.duration_ms,
            summary.total()
        );
        Ok(summary)
    }

    /// Runs all attempts of one test and reports its start and finish.
    async fn run_one(&self, spec: TestSpec, sink: MessageSink) {
        sink.send(Message::Start).await;

        if spec.skipped {
            sink.send(Message::finish(TestOutcome::Skipped)).await;
            return;
        }
        if self.cancel.is_cancelled() {
            sink.send(Message::finish(TestOutcome::Aborted)).await;
            return;
        }

        let started = Instant::now();
        let attempts = self.options.attempts.max(1);
        let mut attempt = 0;
        let outcome = loop {
            if attempt > 0 {
                sink.send(Message::Retry).await;
            }
            debug!("Running {} (attempt {}/{})", spec.path, attempt + 1, attempts);

            let run = self.executor.run_test(&spec.path, attempt, &sink);
            tokio::pin!(run);
            let outcome = tokio::select! {
                result = &mut run => match result {
                    Ok(outcome) => outcome,
                    Err(error) => {
                        sink.send(Message::Error {
                            location: ErrorLocation::Uncaught,
                            in_name: None,
                            stack: format!("{:#}", error),
                        })
                        .await;
                        TestOutcome::Failure
                    }
                },
                _ = tokio::time::sleep(self.options.timeout) => {
                    sink.send(Message::Timeout).await;
                    // Let after hooks report before the attempt is dropped
                    if tokio::time::timeout(self.options.timeout_grace, &mut run)
                        .await
                        .is_err()
                    {
                        debug!("{} still running after grace period, dropping it", spec.path);
                    }
                    TestOutcome::Timeout
                }
                _ = self.cancel.cancelled() => TestOutcome::Aborted,
            };

            attempt += 1;
            let settled = matches!(outcome, TestOutcome::Success | TestOutcome::Aborted);
            if settled || attempt >= attempts {
                break outcome;
            }
        };

        sink.send(Message::Finish {
            result: outcome,
            duration: Some(started.elapsed().as_millis() as u64),
            unstable: outcome == TestOutcome::Success && attempt > 1,
        })
        .await;
    }
}
