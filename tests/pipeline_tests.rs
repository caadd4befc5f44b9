// Reporting pipeline behaviour - public API only

use parasuite::PipelineError;
use parasuite::model::{Message, SuitePath, TestOutcome, TestPath, Time};
use parasuite::report::{
    self, Combined, ErrorTracker, MessageTracker, PhaseTracker, Reporter, RunOptions, TestPhase,
};
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<(Option<TestPath>, Message)>>>;

/// Keeps every forwarded message
#[derive(Clone, Default)]
struct Log(Seen);

impl Log {
    fn seen(&self) -> Vec<(Option<TestPath>, Message)> {
        self.0.lock().unwrap().clone()
    }
}

impl Reporter for Log {
    fn got_message(
        &mut self,
        test_path: Option<&TestPath>,
        message: &Message,
        _time: Option<Time>,
    ) -> anyhow::Result<()> {
        self.0
            .lock()
            .unwrap()
            .push((test_path.cloned(), message.clone()));
        Ok(())
    }
}

fn test(path: &[&str]) -> TestPath {
    TestPath::new("file.js", path.iter().copied())
}

fn suite(path: &[&str]) -> SuitePath {
    SuitePath::new("file.js", path.iter().copied())
}

fn finish() -> Message {
    Message::finish(TestOutcome::Success)
}

fn output(test: &TestPath, line: usize) -> Message {
    Message::Stdout {
        data: format!("{} {}", test.name(), line),
    }
}

fn registered(tests: &[TestPath]) -> (impl Reporter + use<>, Log) {
    let log = Log::default();
    let mut pipeline = report::pipeline(log.clone());
    pipeline
        .register_tests(tests, &RunOptions::default(), None)
        .unwrap();
    (pipeline, log)
}

fn send(reporter: &mut impl Reporter, events: &[(&TestPath, Message)]) {
    for (path, message) in events {
        reporter.got_message(Some(path), message, None).unwrap();
    }
}

/// Start and finish messages only, as (test name, is start)
fn lifecycle(seen: &[(Option<TestPath>, Message)]) -> Vec<(String, bool)> {
    seen.iter()
        .filter_map(|(path, message)| match (path, message) {
            (Some(path), Message::Start) => Some((path.name().to_string(), true)),
            (Some(path), Message::Finish { .. }) => Some((path.name().to_string(), false)),
            _ => None,
        })
        .collect()
}

fn suite_events(seen: &[(Option<TestPath>, Message)]) -> Vec<Message> {
    seen.iter()
        .filter(|(_, m)| matches!(m, Message::SuiteStart { .. } | Message::SuiteFinish { .. }))
        .map(|(_, m)| m.clone())
        .collect()
}

#[test]
fn test_interleaved_root_tests_are_reported_one_after_another() {
    let (t1, t2) = (test(&["test1"]), test(&["test2"]));
    let (mut pipeline, log) = registered(&[t1.clone(), t2.clone()]);

    send(
        &mut pipeline,
        &[
            (&t1, Message::Start),
            (&t2, Message::Start),
            (&t1, finish()),
            (&t2, finish()),
        ],
    );
    pipeline.done(None).unwrap();

    assert_eq!(
        lifecycle(&log.seen()),
        vec![
            ("test1".to_string(), true),
            ("test1".to_string(), false),
            ("test2".to_string(), true),
            ("test2".to_string(), false),
        ]
    );
}

#[test]
fn test_suite_closes_after_its_last_test() {
    let (t1, t2) = (test(&["suite", "test1"]), test(&["suite", "test2"]));
    let (mut pipeline, log) = registered(&[t1.clone(), t2.clone()]);

    send(&mut pipeline, &[(&t1, Message::Start)]);
    assert_eq!(
        suite_events(&log.seen()),
        vec![
            Message::SuiteStart {
                suite: SuitePath::root("file.js")
            },
            Message::SuiteStart {
                suite: suite(&["suite"])
            },
        ]
    );
    assert_eq!(log.seen().last().unwrap().1, Message::Start);

    send(&mut pipeline, &[(&t1, finish()), (&t2, Message::Start)]);
    assert_eq!(suite_events(&log.seen()).len(), 2);

    send(&mut pipeline, &[(&t2, finish())]);
    assert_eq!(
        suite_events(&log.seen())[2..],
        [
            Message::SuiteFinish {
                suite: suite(&["suite"])
            },
            Message::SuiteFinish {
                suite: SuitePath::root("file.js")
            },
        ]
    );
}

#[test]
fn test_nested_suites_open_before_first_test() {
    let (t1, t2) = (test(&["suite", "sub", "t1"]), test(&["suite", "t2"]));
    let (mut pipeline, log) = registered(&[t1.clone(), t2]);

    send(&mut pipeline, &[(&t1, Message::Start)]);

    let seen: Vec<Message> = log.seen().into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        seen,
        vec![
            Message::SuiteStart {
                suite: SuitePath::root("file.js")
            },
            Message::SuiteStart {
                suite: suite(&["suite"])
            },
            Message::SuiteStart {
                suite: suite(&["suite", "sub"])
            },
            Message::Start,
        ]
    );
}

#[test]
fn test_done_with_unmatched_start_fails() {
    let t1 = test(&["test1"]);
    let (mut pipeline, _log) = registered(&[t1.clone()]);

    send(&mut pipeline, &[(&t1, Message::Start)]);
    let error = tokio_test::assert_err!(pipeline.done(None));

    assert!(error.to_string().contains("not been matched"));
    assert!(matches!(
        error.downcast_ref::<PipelineError>(),
        Some(PipelineError::Unmatched { .. })
    ));
}

#[test]
fn test_finished_test_waits_for_permissible_suite() {
    let t1 = test(&["a", "test1"]);
    let t2 = test(&["a", "test2"]);
    let t3 = test(&["b", "test3"]);
    let (mut pipeline, log) = registered(&[t1.clone(), t2.clone(), t3.clone()]);

    send(
        &mut pipeline,
        &[
            (&t1, Message::Start),
            (&t2, Message::Start),
            (&t3, Message::Start),
            (&t3, finish()),
        ],
    );
    // test3 is done but suite "a" still has running tests
    assert_eq!(lifecycle(&log.seen()), vec![("test1".to_string(), true)]);

    send(&mut pipeline, &[(&t1, finish())]);
    assert_eq!(
        lifecycle(&log.seen()).last(),
        Some(&("test2".to_string(), true))
    );

    send(&mut pipeline, &[(&t2, finish())]);
    pipeline.done(None).unwrap();
    let names: Vec<String> = lifecycle(&log.seen())
        .into_iter()
        .filter(|(_, start)| *start)
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["test1", "test2", "test3"]);
}

#[test]
fn test_same_test_registered_twice_is_rejected() {
    let same = test(&["s", "same"]);
    let log = Log::default();
    let mut pipeline = report::pipeline(log.clone());

    let error = tokio_test::assert_err!(pipeline.register_tests(
        &[same.clone(), same],
        &RunOptions::default(),
        None
    ));
    assert!(matches!(
        error.downcast_ref::<PipelineError>(),
        Some(PipelineError::DuplicateTest { .. })
    ));
}

#[test]
fn test_second_start_is_rejected() {
    let (t1, t2) = (test(&["s", "t1"]), test(&["s", "t2"]));
    let (mut pipeline, log) = registered(&[t1.clone(), t2]);

    send(&mut pipeline, &[(&t1, Message::Start)]);
    let error = tokio_test::assert_err!(pipeline.got_message(Some(&t1), &Message::Start, None));
    assert!(matches!(
        error.downcast_ref::<PipelineError>(),
        Some(PipelineError::DuplicateStart { .. })
    ));

    send(&mut pipeline, &[(&t1, finish())]);
    let error = tokio_test::assert_err!(pipeline.got_message(Some(&t1), &finish(), None));
    assert!(matches!(
        error.downcast_ref::<PipelineError>(),
        Some(PipelineError::MessageAfterFinish { .. })
    ));
    assert_eq!(
        lifecycle(&log.seen()),
        vec![("t1".to_string(), true), ("t1".to_string(), false)]
    );
}

#[test]
fn test_empty_run_forwards_nothing() {
    let (mut pipeline, log) = registered(&[]);
    tokio_test::assert_ok!(pipeline.done(None));
    assert!(log.seen().is_empty());
}

#[test]
fn test_pipeline_properties_hold_for_shuffled_interleaving() {
    let tests = vec![
        test(&["outer", "a"]),
        test(&["outer", "inner", "b"]),
        test(&["outer", "inner", "c"]),
        test(&["outer", "d"]),
        test(&["top"]),
        test(&["other", "e"]),
    ];
    let (mut pipeline, log) = registered(&tests);

    // All start, then produce output and finish in an order unrelated to
    // registration
    let mut events: Vec<(&TestPath, Message)> =
        tests.iter().map(|t| (t, Message::Start)).collect();
    for index in [5, 2, 0, 4, 1, 3] {
        let t = &tests[index];
        events.push((t, output(t, 1)));
        events.push((t, output(t, 2)));
        events.push((t, finish()));
    }
    send(&mut pipeline, &events);
    pipeline.done(None).unwrap();

    let seen = log.seen();

    // Every test's own messages keep their order
    for t in &tests {
        let own: Vec<&Message> = seen
            .iter()
            .filter(|(p, _)| p.as_ref() == Some(t))
            .map(|(_, m)| m)
            .collect();
        assert_eq!(own.len(), 4, "{}", t);
        assert_eq!(own[0], &Message::Start);
        assert_eq!(own[1], &output(t, 1));
        assert_eq!(own[2], &output(t, 2));
        assert!(own[3].is_finish());
    }

    // Between a test's start and finish only its own messages appear
    let mut active: Option<&TestPath> = None;
    for (path, message) in &seen {
        match (path, message) {
            (Some(p), Message::Start) => {
                assert!(active.is_none(), "{} started while {:?} active", p, active);
                active = Some(p);
            }
            (Some(p), Message::Finish { .. }) => {
                assert_eq!(active, Some(p));
                active = None;
            }
            (Some(p), _) => assert_eq!(active, Some(p)),
            (None, _) => assert!(active.is_none()),
        }
    }

    // Suites open outermost first, before their tests, and close after them
    for t in &tests {
        let start_at = seen
            .iter()
            .position(|(p, m)| p.as_ref() == Some(t) && *m == Message::Start)
            .unwrap();
        let finish_at = seen
            .iter()
            .position(|(p, m)| p.as_ref() == Some(t) && m.is_finish())
            .unwrap();
        let mut last_open = None;
        for s in t.suite_path().ancestors().collect::<Vec<_>>().into_iter().rev() {
            let open = seen
                .iter()
                .position(|(_, m)| *m == Message::SuiteStart { suite: s.clone() })
                .unwrap();
            let close = seen
                .iter()
                .position(|(_, m)| *m == Message::SuiteFinish { suite: s.clone() })
                .unwrap();
            assert!(open < start_at && close > finish_at, "{} around {}", s, t);
            if let Some(parent_open) = last_open {
                assert!(parent_open < open);
            }
            last_open = Some(open);
        }
    }
}

#[test]
fn test_combined_feeds_trackers_through_pipeline() {
    let t1 = test(&["test1"]);
    let log = Log::default();
    let combined = Combined::new()
        .with(log.clone())
        .with(PhaseTracker::new());
    let mut pipeline = report::pipeline(combined);
    pipeline
        .register_tests(&[t1.clone()], &RunOptions::default(), None)
        .unwrap();

    send(
        &mut pipeline,
        &[
            (&t1, Message::Start),
            (&t1, Message::StartedTest),
            (&t1, finish()),
        ],
    );
    pipeline.done(None).unwrap();

    assert_eq!(lifecycle(&log.seen()).len(), 2);
}

#[test]
fn test_phase_frozen_after_timeout() {
    let t1 = test(&["test1"]);
    let mut tracker = PhaseTracker::new();

    send(
        &mut tracker,
        &[
            (&t1, Message::StartedBeforeHook { name: "H".into() }),
            (&t1, Message::Timeout),
            (&t1, Message::StartedAfterHook { name: "A".into() }),
        ],
    );

    let phase = tracker.get_last_phase(&t1).unwrap();
    assert_eq!(phase.phase, TestPhase::BeforeHook);
    assert_eq!(phase.in_name.as_deref(), Some("H"));
}

#[test]
fn test_retry_resets_trackers() {
    let t1 = test(&["test1"]);
    let mut phases = PhaseTracker::new();
    let mut errors = ErrorTracker::new();
    let mut breadcrumbs = MessageTracker::new(parasuite::model::MessageKind::Breadcrumb);

    let before = [
        (&t1, Message::StartedTest),
        (
            &t1,
            Message::Breadcrumb {
                message: "step".into(),
                trace: None,
            },
        ),
        (
            &t1,
            Message::Error {
                location: parasuite::model::ErrorLocation::Test,
                in_name: None,
                stack: "boom".into(),
            },
        ),
    ];
    for reporter in [
        &mut phases as &mut dyn Reporter,
        &mut errors as &mut dyn Reporter,
        &mut breadcrumbs as &mut dyn Reporter,
    ] {
        for (path, message) in &before {
            reporter.got_message(Some(path), message, None).unwrap();
        }
        reporter.got_message(Some(&t1), &Message::Retry, None).unwrap();
    }

    assert!(phases.get_last_phase(&t1).is_none());
    assert!(errors.get_errors(&t1).is_empty());
    assert!(breadcrumbs.get_messages(&t1).is_empty());
}
