// Summary reporter - totals per outcome at the end of the run

use super::{Capabilities, Reporter, RunOptions};
use crate::model::{Message, TestOutcome, TestPath, Time};
use crate::state::RunSummary;
use anyhow::Result;
use console::Style;
use std::io::{self, Write};

pub struct SummaryReporter {
    out: Box<dyn Write + Send>,
    colors: bool,
    summary: RunSummary,
    started_at: Option<Time>,
}

impl SummaryReporter {
    pub fn new(out: Box<dyn Write + Send>, colors: bool) -> Self {
        Self {
            out,
            colors,
            summary: RunSummary::new(),
            started_at: None,
        }
    }

    pub fn stdout(colors: bool) -> Self {
        Self::new(Box::new(io::stdout()), colors)
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    fn line(&mut self, count: usize, label: &str, style: Style) -> io::Result<()> {
        if count == 0 {
            return Ok(());
        }
        let style = style.force_styling(self.colors);
        writeln!(
            self.out,
            "  {}",
            style.apply_to(format!("{} {}", count, label))
        )
    }
}

impl Reporter for SummaryReporter {
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
        _options: &RunOptions,
        time: Option<Time>,
    ) -> Result<()> {
        self.started_at = time;
        Ok(())
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        _time: Option<Time>,
    ) -> Result<()> {
        if let (Some(_), Some(outcome)) = (test_path, message.outcome()) {
            self.summary.add(outcome);
        }
        Ok(())
    }

    fn done(&mut self, time: Option<Time>) -> Result<()> {
        if let Some((start, end)) = self.started_at.zip(time) {
            self.summary.duration_ms = crate::time::millis_between(start, end);
        }

        let summary = self.summary.clone();
        let dim = Style::new().dim().force_styling(self.colors);
        writeln!(self.out)?;
        writeln!(
            self.out,
            "  {} {}",
            Style::new()
                .green()
                .force_styling(self.colors)
                .apply_to(format!("{} passing", summary.count(TestOutcome::Success))),
            dim.apply_to(format!("({}ms)", summary.duration_ms))
        )?;
        self.line(summary.count(TestOutcome::Skipped), "skipped", Style::new().cyan())?;
        self.line(summary.count(TestOutcome::Failure), "failing", Style::new().red())?;
        self.line(summary.count(TestOutcome::Timeout), "timed out", Style::new().red())?;
        self.line(summary.count(TestOutcome::Aborted), "aborted", Style::new().yellow())?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
