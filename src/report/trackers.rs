// Passive per-test state trackers
//
// These observe the message stream and keep enough state to answer
// "where is this test now" and "what did it emit" for other reporters.

use super::{Capabilities, Reporter};
use crate::model::{Message, MessageKind, TestPath, Time};
use anyhow::Result;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Part of a test that is executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TestPhase {
    BeforeHook,
    Test,
    AfterHook,
}

/// Last known phase of a test, with the hook name when in a hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(rename = "in")]
    pub phase: TestPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_name: Option<String>,
}

impl Phase {
    pub fn describe(&self) -> String {
        match (&self.phase, &self.in_name) {
            (TestPhase::BeforeHook, Some(name)) => format!("before hook \"{}\"", name),
            (TestPhase::BeforeHook, None) => "before hook".to_string(),
            (TestPhase::AfterHook, Some(name)) => format!("after hook \"{}\"", name),
            (TestPhase::AfterHook, None) => "after hook".to_string(),
            (TestPhase::Test, _) => "test".to_string(),
        }
    }
}

/// Tracks the phase each test is in.
///
/// After a `timeout` the phase is frozen until `retry`, so hooks that still
/// run after the timer fired do not hide where the test got stuck.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phases: HashMap<TestPath, Phase>,
    timed_out: HashSet<TestPath>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_last_phase(&self, test: &TestPath) -> Option<&Phase> {
        self.phases.get(test)
    }

    pub fn observe(&mut self, test: &TestPath, message: &Message) {
        let phase = match message {
            Message::Retry => {
                self.phases.remove(test);
                self.timed_out.remove(test);
                return;
            }
            Message::Timeout => {
                self.timed_out.insert(test.clone());
                return;
            }
            Message::StartedBeforeHook { name } => Phase {
                phase: TestPhase::BeforeHook,
                in_name: Some(name.clone()),
            },
            Message::StartedTest => Phase {
                phase: TestPhase::Test,
                in_name: None,
            },
            Message::StartedAfterHook { name } => Phase {
                phase: TestPhase::AfterHook,
                in_name: Some(name.clone()),
            },
            _ => return,
        };

        if !self.timed_out.contains(test) {
            self.phases.insert(test.clone(), phase);
        }
    }
}

impl Reporter for PhaseTracker {
    fn capabilities(&self) -> Capabilities {
        Capabilities::MESSAGES_ONLY
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        _time: Option<Time>,
    ) -> Result<()> {
        if let Some(test) = test_path {
            self.observe(test, message);
        }
        Ok(())
    }
}

/// Collects every message of one kind per test.
///
/// `retry` clears a test's history. When `suppress_after_timeout` is set,
/// messages arriving after a `timeout` are dropped until the next `retry`.
#[derive(Debug)]
pub struct MessageTracker {
    kind: MessageKind,
    suppress_after_timeout: bool,
    messages: HashMap<TestPath, Vec<Message>>,
    timed_out: HashSet<TestPath>,
}

impl MessageTracker {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            suppress_after_timeout: true,
            messages: HashMap::new(),
            timed_out: HashSet::new(),
        }
    }

    pub fn get_messages(&self, test: &TestPath) -> &[Message] {
        self.messages.get(test).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn observe(&mut self, test: &TestPath, message: &Message) {
        match message.kind() {
            MessageKind::Retry => {
                self.messages.remove(test);
                self.timed_out.remove(test);
            }
            MessageKind::Timeout => {
                self.timed_out.insert(test.clone());
            }
            kind if kind == self.kind => {
                if self.suppress_after_timeout && self.timed_out.contains(test) {
                    return;
                }
                self.messages
                    .entry(test.clone())
                    .or_default()
                    .push(message.clone());
            }
            _ => {}
        }
    }
}

impl Reporter for MessageTracker {
    fn capabilities(&self) -> Capabilities {
        Capabilities::MESSAGES_ONLY
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        _time: Option<Time>,
    ) -> Result<()> {
        if let Some(test) = test_path {
            self.observe(test, message);
        }
        Ok(())
    }
}

/// Collects `error` messages per test, including ones raised after a timeout
/// (an after hook failing during cleanup is still worth showing).
#[derive(Debug)]
pub struct ErrorTracker(MessageTracker);

impl Default for ErrorTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorTracker {
    pub fn new() -> Self {
        let mut tracker = MessageTracker::new(MessageKind::Error);
        tracker.suppress_after_timeout = false;
        Self(tracker)
    }

    pub fn get_errors(&self, test: &TestPath) -> &[Message] {
        self.0.get_messages(test)
    }

    pub fn observe(&mut self, test: &TestPath, message: &Message) {
        self.0.observe(test, message);
    }
}

impl Reporter for ErrorTracker {
    fn capabilities(&self) -> Capabilities {
        Capabilities::MESSAGES_ONLY
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        self.0.got_message(test_path, message, time)
    }
}
