// Report module - reporter contract and the message pipeline

pub mod combined;
pub mod error_detail;
pub mod json;
pub mod serializer;
pub mod spec;
pub mod suite_marker;
pub mod summary;
pub mod teamcity;
pub mod timestamper;
pub mod trackers;

use crate::model::{Message, TestPath, Time};
use anyhow::Result;
use serde::Serialize;

pub use combined::Combined;
pub use error_detail::ErrorDetailReporter;
pub use json::JsonStreamReporter;
pub use serializer::Serializer;
pub use spec::SpecReporter;
pub use suite_marker::SuiteMarker;
pub use summary::SummaryReporter;
pub use teamcity::TeamCityReporter;
pub use timestamper::Timestamper;
pub use trackers::{ErrorTracker, MessageTracker, Phase, PhaseTracker, TestPhase};

/// Run parameters handed to reporters along with the test list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    pub parallelism: usize,
    pub timeout_ms: u64,
    pub attempts: u32,
    pub slow_threshold_ms: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            timeout_ms: 10_000,
            attempts: 1,
            slow_threshold_ms: 1_000,
        }
    }
}

/// Hooks a reporter actually implements.
///
/// [`Combined`] reads these once when a reporter is added and skips the
/// hooks a reporter does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub registration_failed: bool,
    pub register_tests: bool,
    pub got_message: bool,
    pub done: bool,
}

impl Capabilities {
    pub const ALL: Self = Self {
        registration_failed: true,
        register_tests: true,
        got_message: true,
        done: true,
    };

    pub const NONE: Self = Self {
        registration_failed: false,
        register_tests: false,
        got_message: false,
        done: false,
    };

    /// Passive observers that only look at the message stream
    pub const MESSAGES_ONLY: Self = Self {
        got_message: true,
        ..Self::NONE
    };
}

/// Downstream consumer of the lifecycle message stream.
///
/// Every hook has a no-op default. `test_path` is `None` for synthetic
/// suite-boundary messages. Errors returned from a hook propagate to the
/// caller unchanged.
pub trait Reporter: Send {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    /// Test discovery failed, no tests will run
    fn registration_failed(&mut self, _error: &anyhow::Error, _time: Option<Time>) -> Result<()> {
        Ok(())
    }

    /// Called once with every test that will report, before any message
    fn register_tests(
        &mut self,
        _tests: &[TestPath],
        _options: &RunOptions,
        _time: Option<Time>,
    ) -> Result<()> {
        Ok(())
    }

    fn got_message(
        &mut self,
        _test_path: Option<&TestPath>,
        _message: &Message,
        _time: Option<Time>,
    ) -> Result<()> {
        Ok(())
    }

    /// Called once after every registered test has finished
    fn done(&mut self, _time: Option<Time>) -> Result<()> {
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn registration_failed(&mut self, error: &anyhow::Error, time: Option<Time>) -> Result<()> {
        (**self).registration_failed(error, time)
    }

    fn register_tests(
        &mut self,
        tests: &[TestPath],
        options: &RunOptions,
        time: Option<Time>,
    ) -> Result<()> {
        (**self).register_tests(tests, options, time)
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        (**self).got_message(test_path, message, time)
    }

    fn done(&mut self, time: Option<Time>) -> Result<()> {
        (**self).done(time)
    }
}

/// Builds the standard pipeline: stamp times, serialize, then mark suites.
pub fn pipeline<R: Reporter>(downstream: R) -> Timestamper<Serializer<SuiteMarker<R>>> {
    Timestamper::new(Serializer::new(SuiteMarker::new(downstream)))
}
