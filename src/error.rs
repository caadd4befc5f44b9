// Pipeline usage errors

use crate::model::TestPath;
use thiserror::Error;

/// Contract violations by whoever drives the reporting pipeline.
///
/// These are programming errors upstream, never test failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("{component}: got a message before registerTests was called")]
    NotRegistered { component: &'static str },

    #[error("{component}: registerTests called more than once")]
    AlreadyRegistered { component: &'static str },

    #[error("{component}: got a message for unregistered test {test}")]
    UnknownTest {
        component: &'static str,
        test: TestPath,
    },

    #[error("{component}: test {test} registered more than once")]
    DuplicateTest {
        component: &'static str,
        test: TestPath,
    },

    #[error("{component}: test {test} started twice")]
    DuplicateStart {
        component: &'static str,
        test: TestPath,
    },

    #[error("{component}: got a message for test {test} after it finished")]
    MessageAfterFinish {
        component: &'static str,
        test: TestPath,
    },

    #[error(
        "{component}: start and finish messages have not been matched \
         ({pending} test(s) still pending)"
    )]
    Unmatched {
        component: &'static str,
        pending: usize,
    },
}
