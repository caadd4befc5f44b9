// Combined reporter - broadcasts every hook to a list of reporters

use super::{Capabilities, Reporter, RunOptions};
use crate::model::{Message, TestPath, Time};
use anyhow::Result;

/// Fans each hook out to its reporters in the order they were added.
///
/// The first reporter error stops the broadcast and is returned as is.
#[derive(Default)]
pub struct Combined {
    reporters: Vec<(Capabilities, Box<dyn Reporter>)>,
}

impl Combined {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reporter; its capabilities are read once here.
    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        let capabilities = reporter.capabilities();
        self.reporters.push((capabilities, reporter));
    }

    pub fn with(mut self, reporter: impl Reporter + 'static) -> Self {
        self.push(Box::new(reporter));
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl FromIterator<Box<dyn Reporter>> for Combined {
    fn from_iter<I: IntoIterator<Item = Box<dyn Reporter>>>(iter: I) -> Self {
        let mut combined = Self::new();
        for reporter in iter {
            combined.push(reporter);
        }
        combined
    }
}

impl Reporter for Combined {
    fn registration_failed(&mut self, error: &anyhow::Error, time: Option<Time>) -> Result<()> {
        for (caps, reporter) in &mut self.reporters {
            if caps.registration_failed {
                reporter.registration_failed(error, time)?;
            }
        }
        Ok(())
    }

    fn register_tests(
        &mut self,
        tests: &[TestPath],
        options: &RunOptions,
        time: Option<Time>,
    ) -> Result<()> {
        for (caps, reporter) in &mut self.reporters {
            if caps.register_tests {
                reporter.register_tests(tests, options, time)?;
            }
        }
        Ok(())
    }

    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        time: Option<Time>,
    ) -> Result<()> {
        for (caps, reporter) in &mut self.reporters {
            if caps.got_message {
                reporter.got_message(test_path, message, time)?;
            }
        }
        Ok(())
    }

    fn done(&mut self, time: Option<Time>) -> Result<()> {
        for (caps, reporter) in &mut self.reporters {
            if caps.done {
                reporter.done(time)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::testing::{Event, Recorder};
    use std::sync::{Arc, Mutex};

    struct Failing;

    impl Reporter for Failing {
        fn done(&mut self, _time: Option<Time>) -> Result<()> {
            anyhow::bail!("reporter exploded")
        }
    }

    /// Declares only `done`, so its other hooks must never run
    struct DoneOnly {
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Reporter for DoneOnly {
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                done: true,
                ..Capabilities::NONE
            }
        }

        fn got_message(
            &mut self,
            _test_path: Option<&TestPath>,
            _message: &Message,
            _time: Option<Time>,
        ) -> Result<()> {
            self.calls.lock().unwrap().push("got_message");
            Ok(())
        }

        fn done(&mut self, _time: Option<Time>) -> Result<()> {
            self.calls.lock().unwrap().push("done");
            Ok(())
        }
    }

    #[test]
    fn test_broadcasts_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = Recorder {
            events: Arc::new(Mutex::new(Vec::new())),
        };
        let second = DoneOnly {
            calls: order.clone(),
        };
        let mut combined = Combined::new().with(first.clone()).with(second);

        let path = TestPath::new("f", ["t"]);
        combined
            .got_message(Some(&path), &Message::Start, None)
            .unwrap();
        combined.done(None).unwrap();

        assert_eq!(
            first.events(),
            vec![Event::Message(Some(path), Message::Start), Event::Done]
        );
        assert_eq!(*order.lock().unwrap(), vec!["done"]);
    }

    #[test]
    fn test_reporter_error_propagates() {
        let later = Recorder::default();
        let mut combined = Combined::new().with(Failing).with(later.clone());

        let err = combined.done(None).unwrap_err();
        assert!(err.to_string().contains("reporter exploded"));
        assert!(later.events().is_empty());
    }

    #[test]
    fn test_empty_combined_is_noop() {
        let mut combined = Combined::new();
        assert!(combined.is_empty());
        combined
            .register_tests(&[], &RunOptions::default(), None)
            .unwrap();
        combined.done(None).unwrap();
    }
}
