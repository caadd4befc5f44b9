// Test execution - one isolated attempt of one test

use super::discovery::expand_template;
use crate::model::{Message, MessageKind, TestOutcome, TestPath, Time};
use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Environment variable carrying the zero-based attempt number to the child
pub const ENV_ATTEMPT: &str = "PARASUITE_ATTEMPT";

/// A message produced by a running test, stamped when it was produced
#[derive(Debug, Clone)]
pub struct Envelope {
    pub test: TestPath,
    pub message: Message,
    pub time: Time,
}

/// Where a running test reports its messages
#[derive(Clone)]
pub struct MessageSink {
    test: TestPath,
    tx: mpsc::Sender<Envelope>,
}

impl MessageSink {
    pub fn new(test: TestPath, tx: mpsc::Sender<Envelope>) -> Self {
        Self { test, tx }
    }

    pub fn test(&self) -> &TestPath {
        &self.test
    }

    pub async fn send(&self, message: Message) {
        let envelope = Envelope {
            test: self.test.clone(),
            message,
            time: crate::time::now(),
        };
        // The consumer only goes away when the run is being torn down
        let _ = self.tx.send(envelope).await;
    }
}

/// Runs one attempt of a test in isolation.
///
/// Implementations report hook phases, errors, breadcrumbs and output through
/// the sink and return `Success` or `Failure`. `start`, `finish`, `retry` and
/// `timeout` belong to the runner and must not be sent.
pub trait TestExecutor: Send + Sync {
    fn run_test(
        &self,
        test: &TestPath,
        attempt: u32,
        sink: &MessageSink,
    ) -> impl Future<Output = Result<TestOutcome>> + Send;
}

/// Messages a child process may report about itself
fn is_child_message(kind: MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::Error
            | MessageKind::Breadcrumb
            | MessageKind::StartedBeforeHook
            | MessageKind::StartedTest
            | MessageKind::StartedAfterHook
            | MessageKind::Stdout
            | MessageKind::Stderr
    )
}

/// Maps one stdout line of a child to a message. JSON lines carrying a
/// child-reportable message are taken as is, anything else is plain output.
pub fn parse_stdout_line(line: String) -> Message {
    if line.trim_start().starts_with('{')
        && let Ok(message) = serde_json::from_str::<Message>(&line)
    {
        if is_child_message(message.kind()) {
            return message;
        }
        debug!("Ignoring runner-owned message from child: {}", line);
    }
    Message::Stdout { data: line }
}

/// Spawns one process per attempt from a command template.
///
/// `{file}` is replaced by the test file and `{test}` by the JSON array of
/// the test's path. Exit status 0 means the attempt passed. The process is
/// killed if the attempt is abandoned (timeout, cancellation).
pub struct CommandExecutor {
    command: Vec<String>,
}

impl CommandExecutor {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl TestExecutor for CommandExecutor {
    async fn run_test(
        &self,
        test: &TestPath,
        attempt: u32,
        sink: &MessageSink,
    ) -> Result<TestOutcome> {
        let test_arg = serde_json::to_string(&test.path)?;
        let (program, args) =
            expand_template(&self.command, Path::new(&test.file), Some(&test_arg))?;
        debug!("Spawning {} for {} (attempt {})", program, test, attempt + 1);

        let mut child = Command::new(&program)
            .args(&args)
            .env(ENV_ATTEMPT, attempt.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", program))?;

        let stdout = child.stdout.take().context("Child stdout not captured")?;
        let stderr = child.stderr.take().context("Child stderr not captured")?;

        let read_stdout = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                sink.send(parse_stdout_line(line)).await;
            }
            Ok::<_, std::io::Error>(())
        };
        let read_stderr = async {
            let mut lines = BufReader::new(stderr).lines();
            while let Some(line) = lines.next_line().await? {
                sink.send(Message::Stderr { data: line }).await;
            }
            Ok::<_, std::io::Error>(())
        };

        let (out, err) = tokio::join!(read_stdout, read_stderr);
        out.context("Failed to read child stdout")?;
        err.context("Failed to read child stderr")?;

        let status = child.wait().await.context("Failed to wait for child")?;
        debug!("{} exited with {}", test, status);
        Ok(if status.success() {
            TestOutcome::Success
        } else {
            TestOutcome::Failure
        })
    }
}
