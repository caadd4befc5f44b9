// Model module - test addressing and lifecycle messages

pub mod message;
pub mod path;

pub use message::{ErrorLocation, Message, MessageKind, TestOutcome};
pub use path::{SuitePath, TestPath};

/// Wall-clock time attached to reporter hooks
pub type Time = chrono::DateTime<chrono::Utc>;
