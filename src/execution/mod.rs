// Execution module

pub mod discovery;
pub mod executor;
pub mod runner;

pub use discovery::{CommandDiscovery, HookInfo, SuiteNode, TestDiscovery, TestSpec, flatten_suite};
pub use executor::{CommandExecutor, Envelope, MessageSink, TestExecutor};
pub use runner::{CancelHandle, RunnerOptions, SuiteRunner};
