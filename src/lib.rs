pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod model;
pub mod report;
pub mod state;
pub mod time;
pub mod utils;

pub use error::PipelineError;
pub use execution::{RunnerOptions, SuiteRunner};
pub use model::{Message, SuitePath, TestOutcome, TestPath};
pub use report::{Reporter, pipeline};
