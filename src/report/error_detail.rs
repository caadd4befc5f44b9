// Error detail reporter - explains every failed test at the end of the run

use super::trackers::{ErrorTracker, MessageTracker, PhaseTracker};
use super::{Capabilities, Reporter};
use crate::model::{ErrorLocation, Message, MessageKind, TestOutcome, TestPath, Time};
use anyhow::Result;
use console::Style;
use std::io::{self, Write};

/// Lists failed, timed out and aborted tests with their errors, the phase a
/// timed out test was stuck in and the breadcrumbs it left.
pub struct ErrorDetailReporter {
    out: Box<dyn Write + Send>,
    colors: bool,
    errors: ErrorTracker,
    breadcrumbs: MessageTracker,
    phases: PhaseTracker,
    failed: Vec<(TestPath, TestOutcome)>,
}

impl ErrorDetailReporter {
    pub fn new(out: Box<dyn Write + Send>, colors: bool) -> Self {
        Self {
            out,
            colors,
            errors: ErrorTracker::new(),
            breadcrumbs: MessageTracker::new(MessageKind::Breadcrumb),
            phases: PhaseTracker::new(),
            failed: Vec::new(),
        }
    }

    pub fn stdout(colors: bool) -> Self {
        Self::new(Box::new(io::stdout()), colors)
    }

    fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn location(location: ErrorLocation, name: Option<&str>) -> String {
        let place = match location {
            ErrorLocation::BeforeHook => "before hook",
            ErrorLocation::AfterHook => "after hook",
            ErrorLocation::Test => "test",
            ErrorLocation::Uncaught => "uncaught error",
        };
        match name {
            Some(name) => format!("{} \"{}\"", place, name),
            None => place.to_string(),
        }
    }

    fn write_test(
        &mut self,
        index: usize,
        test: &TestPath,
        outcome: TestOutcome,
    ) -> io::Result<()> {
        let red = Style::new().red().force_styling(self.colors);
        let dim = Style::new().dim().force_styling(self.colors);

        writeln!(self.out, "  {}) {}:", index + 1, test.path.join(" › "))?;
        writeln!(self.out, "     {}", dim.apply_to(&test.file))?;

        match outcome {
            TestOutcome::Timeout => {
                let suffix = self
                    .phases
                    .get_last_phase(test)
                    .map(|phase| format!(" in {}", phase.describe()))
                    .unwrap_or_default();
                writeln!(self.out, "     {}", red.apply_to(format!("Timed out{}", suffix)))?;
            }
            TestOutcome::Aborted => {
                writeln!(self.out, "     {}", red.apply_to("Aborted"))?;
            }
            _ => {}
        }

        let breadcrumbs = self.breadcrumbs.get_messages(test).to_vec();
        if outcome == TestOutcome::Timeout && !breadcrumbs.is_empty() {
            writeln!(self.out, "     Last breadcrumbs:")?;
            for crumb in &breadcrumbs {
                if let Message::Breadcrumb { message, .. } = crumb {
                    writeln!(self.out, "       - {}", message)?;
                }
            }
        }

        let errors = self.errors.get_errors(test).to_vec();
        for error in &errors {
            if let Message::Error {
                location,
                in_name,
                stack,
            } = error
            {
                writeln!(
                    self.out,
                    "     In {}:",
                    Self::location(*location, in_name.as_deref())
                )?;
                writeln!(self.out, "{}", red.apply_to(Self::indent(stack, "       ")))?;
            }
        }
        writeln!(self.out)
    }
}

impl Reporter for ErrorDetailReporter {
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
        _time: Option<Time>,
    ) -> Result<()> {
        let Some(test) = test_path else {
            return Ok(());
        };

        self.errors.observe(test, message);
        self.breadcrumbs.observe(test, message);
        self.phases.observe(test, message);

        if let Some(outcome) = message.outcome()
            && outcome.is_failure()
        {
            self.failed.push((test.clone(), outcome));
        }
        Ok(())
    }

    fn done(&mut self, _time: Option<Time>) -> Result<()> {
        let failed = std::mem::take(&mut self.failed);
        for (index, (test, outcome)) in failed.iter().enumerate() {
            self.write_test(index, test, *outcome)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::SharedBuf;

    fn send(reporter: &mut ErrorDetailReporter, test: &TestPath, message: Message) {
        reporter.got_message(Some(test), &message, None).unwrap();
    }

    #[test]
    fn test_failure_lists_errors() {
        let buf = SharedBuf::default();
        let mut reporter = ErrorDetailReporter::new(Box::new(buf.clone()), false);
        let test = TestPath::new("spec.js", ["suite", "breaks"]);

        send(&mut reporter, &test, Message::Start);
        send(
            &mut reporter,
            &test,
            Message::Error {
                location: ErrorLocation::Test,
                in_name: None,
                stack: "Error: nope\n    at line 1".into(),
            },
        );
        send(&mut reporter, &test, Message::finish(TestOutcome::Failure));
        reporter.done(None).unwrap();

        assert_eq!(
            buf.text(),
            "  1) suite › breaks:\n     spec.js\n     In test:\n       Error: nope\n           at line 1\n\n"
        );
    }

    #[test]
    fn test_timeout_reports_phase_and_breadcrumbs() {
        let buf = SharedBuf::default();
        let mut reporter = ErrorDetailReporter::new(Box::new(buf.clone()), false);
        let test = TestPath::new("spec.js", ["hangs"]);

        send(&mut reporter, &test, Message::Start);
        send(
            &mut reporter,
            &test,
            Message::StartedBeforeHook {
                name: "connect".into(),
            },
        );
        send(
            &mut reporter,
            &test,
            Message::Breadcrumb {
                message: "dialing".into(),
                trace: None,
            },
        );
        send(&mut reporter, &test, Message::Timeout);
        send(
            &mut reporter,
            &test,
            Message::StartedAfterHook {
                name: "close".into(),
            },
        );
        send(&mut reporter, &test, Message::finish(TestOutcome::Timeout));
        reporter.done(None).unwrap();

        let text = buf.text();
        assert!(text.contains("Timed out in before hook \"connect\""));
        assert!(text.contains("       - dialing"));
    }

    #[test]
    fn test_passing_tests_print_nothing() {
        let buf = SharedBuf::default();
        let mut reporter = ErrorDetailReporter::new(Box::new(buf.clone()), false);
        let test = TestPath::new("spec.js", ["ok"]);

        send(&mut reporter, &test, Message::Start);
        send(&mut reporter, &test, Message::finish(TestOutcome::Success));
        reporter.done(None).unwrap();

        assert!(buf.text().is_empty());
    }
}
