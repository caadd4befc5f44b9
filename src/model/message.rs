// Lifecycle messages emitted by running tests

use super::path::SuitePath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final result carried by a `finish` message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestOutcome {
    Success,
    Failure,
    Skipped,
    Timeout,
    Aborted,
}

impl TestOutcome {
    /// Whether this outcome should fail the run
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failure | Self::Timeout | Self::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
            Self::Timeout => "timeout",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorLocation {
    BeforeHook,
    Test,
    AfterHook,
    Uncaught,
}

/// One step of a test's execution.
///
/// The wire shape is an object tagged by `type`, e.g.
/// `{"type": "finish", "result": "success"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    Start,
    Finish {
        result: TestOutcome,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        unstable: bool,
    },
    SuiteStart {
        suite: SuitePath,
    },
    SuiteFinish {
        suite: SuitePath,
    },
    Error {
        #[serde(rename = "in")]
        location: ErrorLocation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        in_name: Option<String>,
        stack: String,
    },
    Breadcrumb {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trace: Option<String>,
    },
    Retry,
    Timeout,
    StartedBeforeHook {
        name: String,
    },
    StartedTest,
    StartedAfterHook {
        name: String,
    },
    Stdout {
        data: String,
    },
    Stderr {
        data: String,
    },
}

/// Fieldless tag of a [`Message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Start,
    Finish,
    SuiteStart,
    SuiteFinish,
    Error,
    Breadcrumb,
    Retry,
    Timeout,
    StartedBeforeHook,
    StartedTest,
    StartedAfterHook,
    Stdout,
    Stderr,
}

impl Message {
    pub fn finish(result: TestOutcome) -> Self {
        Self::Finish {
            result,
            duration: None,
            unstable: false,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Start => MessageKind::Start,
            Self::Finish { .. } => MessageKind::Finish,
            Self::SuiteStart { .. } => MessageKind::SuiteStart,
            Self::SuiteFinish { .. } => MessageKind::SuiteFinish,
            Self::Error { .. } => MessageKind::Error,
            Self::Breadcrumb { .. } => MessageKind::Breadcrumb,
            Self::Retry => MessageKind::Retry,
            Self::Timeout => MessageKind::Timeout,
            Self::StartedBeforeHook { .. } => MessageKind::StartedBeforeHook,
            Self::StartedTest => MessageKind::StartedTest,
            Self::StartedAfterHook { .. } => MessageKind::StartedAfterHook,
            Self::Stdout { .. } => MessageKind::Stdout,
            Self::Stderr { .. } => MessageKind::Stderr,
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish { .. })
    }

    /// The result of a `finish` message
    pub fn outcome(&self) -> Option<TestOutcome> {
        match self {
            Self::Finish { result, .. } => Some(*result),
            _ => None,
        }
    }
}
