use super::{Reporter, RunOptions};
use crate::model::{Message, TestPath, Time};
use anyhow::Result;
use serde_json::json;
use std::io::{self, Write};

/// Writes one JSON event per line for editors and CI tooling.
pub struct JsonStreamReporter {
    out: Box<dyn Write + Send>,
}

impl JsonStreamReporter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn emit(&mut self, mut event: serde_json::Value, time: Option<Time>) -> Result<()> {
        if let Some(time) = time {
            event["timestamp"] = json!(time.to_rfc3339());
        }
        let line = serde_json::to_string(&event)?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }
}

impl Reporter for JsonStreamReporter {
    fn registration_failed(&mut self, error: &anyhow::Error, time: Option<Time>) -> Result<()> {
        self.emit(
            json!({
                "event": "registrationFailed",
                "error": format!("{:#}", error)
            }),
            time,
        )
    }

    fn register_tests(
        &mut self,
        tests: &[TestPath],
        options: &RunOptions,
        time: Option<Time>,
    ) -> Result<()> {
        self.emit(
            json!({
                "event": "registerTests",
                "testCount": tests.len(),
                "tests": tests,
                "options": options
            }),
            time,
        )
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        self.emit(
            json!({
                "event": "message",
                "testPath": test_path,
                "message": message
            }),
            time,
        )
    }

    fn done(&mut self, time: Option<Time>) -> Result<()> {
        self.emit(json!({ "event": "done" }), time)
    }
}
