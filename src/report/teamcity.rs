// TeamCity reporter - service messages understood by TeamCity builds

use super::trackers::ErrorTracker;
use super::{Capabilities, Reporter};
use crate::model::{Message, TestOutcome, TestPath, Time};
use anyhow::Result;
use std::collections::HashMap;
use std::io::{self, Write};

pub struct TeamCityReporter {
    out: Box<dyn Write + Send>,
    errors: ErrorTracker,
    started: HashMap<TestPath, Time>,
}

/// Escape a value for a `##teamcity[...]` attribute
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => escaped.push_str("||"),
            '\'' => escaped.push_str("|'"),
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            '[' => escaped.push_str("|["),
            ']' => escaped.push_str("|]"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl TeamCityReporter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            errors: ErrorTracker::new(),
            started: HashMap::new(),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn service(&mut self, name: &str, attributes: &[(&str, String)]) -> io::Result<()> {
        let attrs: String = attributes
            .iter()
            .map(|(key, value)| format!(" {}='{}'", key, escape(value)))
            .collect();
        writeln!(self.out, "##teamcity[{}{}]", name, attrs)
    }

    fn error_details(&self, test: &TestPath) -> String {
        self.errors
            .get_errors(test)
            .iter()
            .filter_map(|m| match m {
                Message::Error { stack, .. } => Some(stack.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn finished(
        &mut self,
        test: &TestPath,
        result: TestOutcome,
        duration: Option<u64>,
        time: Option<Time>,
    ) -> io::Result<()> {
        let name = test.name().to_string();
        match result {
            TestOutcome::Skipped => {
                self.service("testIgnored", &[("name", name.clone())])?;
            }
            TestOutcome::Failure | TestOutcome::Timeout | TestOutcome::Aborted => {
                let message = match result {
                    TestOutcome::Timeout => "Timed out",
                    TestOutcome::Aborted => "Aborted",
                    _ => "Failed",
                };
                let details = self.error_details(test);
                self.service(
                    "testFailed",
                    &[
                        ("name", name.clone()),
                        ("message", message.to_string()),
                        ("details", details),
                    ],
                )?;
            }
            TestOutcome::Success => {}
        }

        let started = self.started.remove(test);
        let duration = duration
            .or_else(|| {
                started
                    .zip(time)
                    .map(|(start, end)| crate::time::millis_between(start, end))
            })
            .unwrap_or(0);
        self.service(
            "testFinished",
            &[("name", name), ("duration", duration.to_string())],
        )
    }
}

impl Reporter for TeamCityReporter {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            got_message: true,
            done: true,
            ..Capabilities::NONE
        }
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        if let Some(test) = test_path {
            self.errors.observe(test, message);
        }

        match (test_path, message) {
            (None, Message::SuiteStart { suite }) => {
                if let Some(name) = suite.name() {
                    self.service("testSuiteStarted", &[("name", name.to_string())])?;
                }
            }
            (None, Message::SuiteFinish { suite }) => {
                if let Some(name) = suite.name() {
                    self.service("testSuiteFinished", &[("name", name.to_string())])?;
                }
            }
            (Some(test), Message::Start) => {
                if let Some(time) = time {
                    self.started.insert(test.clone(), time);
                }
                self.service("testStarted", &[("name", test.name().to_string())])?;
            }
            (Some(test), Message::Stdout { data }) => {
                self.service(
                    "testStdOut",
                    &[("name", test.name().to_string()), ("out", data.clone())],
                )?;
            }
            (Some(test), Message::Stderr { data }) => {
                self.service(
                    "testStdErr",
                    &[("name", test.name().to_string()), ("out", data.clone())],
                )?;
            }
            (
                Some(test),
                Message::Finish {
                    result, duration, ..
                },
            ) => {
                self.finished(test, *result, *duration, time)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn done(&mut self, _time: Option<Time>) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
