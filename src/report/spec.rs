// Spec reporter - indented tree of suites and tests on the console

use super::{Capabilities, Reporter, RunOptions};
use crate::model::{Message, TestOutcome, TestPath, Time};
use anyhow::Result;
use console::Style;
use std::collections::HashMap;
use std::io::{self, Write};

/// Prints suites as headings and one line per finished test.
///
/// Expects a serialized stream: suite headings are printed on `suiteStart`
/// and tests are indented under the suite that contains them.
pub struct SpecReporter {
    out: Box<dyn Write + Send>,
    colors: bool,
    slow_threshold_ms: u64,
    started: HashMap<TestPath, Time>,
    failures: usize,
}

impl SpecReporter {
    pub fn new(out: Box<dyn Write + Send>, colors: bool) -> Self {
        Self {
            out,
            colors,
            slow_threshold_ms: RunOptions::default().slow_threshold_ms,
            started: HashMap::new(),
            failures: 0,
        }
    }

    pub fn stdout(colors: bool) -> Self {
        Self::new(Box::new(io::stdout()), colors)
    }

    fn style(&self, style: Style) -> Style {
        style.force_styling(self.colors)
    }

    fn indent(depth: usize) -> String {
        "  ".repeat(depth + 1)
    }

    fn duration_suffix(&self, duration: u64) -> String {
        if duration >= self.slow_threshold_ms {
            let red = self.style(Style::new().red());
            format!(" {}", red.apply_to(format!("({}ms)", duration)))
        } else if duration * 2 >= self.slow_threshold_ms {
            let yellow = self.style(Style::new().yellow());
            format!(" {}", yellow.apply_to(format!("({}ms)", duration)))
        } else {
            String::new()
        }
    }

    fn finish_line(
        &mut self,
        test: &TestPath,
        result: TestOutcome,
        duration: Option<u64>,
        unstable: bool,
    ) -> String {
        let indent = Self::indent(test.suite_path().depth());
        let name = test.name();
        let mut line = match result {
            TestOutcome::Success => {
                let green = self.style(Style::new().green());
                format!("{}{} {}", indent, green.apply_to("✓"), name)
            }
            TestOutcome::Skipped => {
                let cyan = self.style(Style::new().cyan());
                format!("{}{}", indent, cyan.apply_to(format!("- {}", name)))
            }
            TestOutcome::Failure | TestOutcome::Timeout | TestOutcome::Aborted => {
                self.failures += 1;
                let red = self.style(Style::new().red());
                let label = match result {
                    TestOutcome::Timeout => format!("{}) {} (timeout)", self.failures, name),
                    TestOutcome::Aborted => format!("{}) {} (aborted)", self.failures, name),
                    _ => format!("{}) {}", self.failures, name),
                };
                format!("{}{}", indent, red.apply_to(label))
            }
        };

        if result == TestOutcome::Success {
            if let Some(duration) = duration {
                line.push_str(&self.duration_suffix(duration));
            }
            if unstable {
                let yellow = self.style(Style::new().yellow());
                line.push_str(&format!(" {}", yellow.apply_to("(unstable)")));
            }
        }
        line
    }
}

impl Reporter for SpecReporter {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            register_tests: true,
            got_message: true,
            done: true,
            ..Capabilities::NONE
        }
    }

    fn register_tests(
        &mut self,
        _tests: &[TestPath],
        options: &RunOptions,
        _time: Option<Time>,
    ) -> Result<()> {
        self.slow_threshold_ms = options.slow_threshold_ms;
        Ok(())
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        match (test_path, message) {
            (None, Message::SuiteStart { suite }) => {
                if let Some(name) = suite.name() {
                    writeln!(self.out, "{}{}", Self::indent(suite.depth() - 1), name)?;
                } else {
                    writeln!(self.out)?;
                }
            }
            (Some(test), Message::Start) => {
                if let Some(time) = time {
                    self.started.insert(test.clone(), time);
                }
            }
            (
                Some(test),
                Message::Finish {
                    result,
                    duration,
                    unstable,
                },
            ) => {
                let started = self.started.remove(test);
                let duration = duration.or_else(|| {
                    started
                        .zip(time)
                        .map(|(start, end)| crate::time::millis_between(start, end))
                });
                let line = self.finish_line(test, *result, duration, *unstable);
                writeln!(self.out, "{}", line)?;
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
