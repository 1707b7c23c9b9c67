//! Tests for injectable effect runners.

use deferral::effect::{
    Computation, DirectRunner, EffectDescriptor, EffectOutcome, EffectRecord, EffectRunner, Panic,
    RecordingRunner, Resumption,
};
use deferral::trusted;
use rstest::rstest;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// Answers every `u32` request from a fixed table instead of calling the operation.
struct Stub {
    answer: u32,
}

impl EffectRunner for Stub {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        if descriptor.request().downcast_ref::<u32>().is_some() {
            let (_, continuations) = descriptor.split();
            continuations.fail(Panic::from_message(format!("stubbed {}", self.answer)))
        } else {
            DirectRunner.run(descriptor)
        }
    }
}

/// Counts descriptors and delegates.
#[derive(Default)]
struct Counting {
    count: Cell<usize>,
}

impl EffectRunner for Counting {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        self.count.set(self.count.get() + 1);
        DirectRunner.run(descriptor)
    }
}

#[test]
fn runner_is_invoked_once_per_reached_effect() {
    let runner = Counting::default();
    let computation = Computation::attempt(1, |n: i32| n)
        .map(|n| n + 1)
        .bind(|n| Computation::attempt(n, |n: i32| n * 10))
        .map_e(|panic| panic.to_string())
        .caught();

    assert_eq!(trusted::perform_pure_with(&runner, computation), Ok(20));
    assert_eq!(runner.count.get(), 2);
}

#[test]
fn substituted_runner_decides_outcome() {
    let runner = Stub { answer: 9 };
    let computation = Computation::attempt(1_u32, |n: u32| n + 1);
    let error = trusted::perform_with(&runner, computation).unwrap_err();
    assert_eq!(error.message(), "stubbed 9");
}

#[test]
fn substituted_runner_can_delegate() {
    let runner = Stub { answer: 9 };
    let computation = Computation::attempt(1_i64, |n: i64| n + 1);
    assert_eq!(trusted::perform_with(&runner, computation).ok(), Some(2));
}

#[rstest]
#[case::shared(Arc::new(DirectRunner) as Arc<dyn EffectRunner>)]
#[case::boxed_in_arc(Arc::new(Box::new(DirectRunner)) as Arc<dyn EffectRunner>)]
fn runner_behind_smart_pointer(#[case] runner: Arc<dyn EffectRunner>) {
    let computation = Computation::attempt(20, |n: i32| n + 1).map(|n| n * 2);
    assert_eq!(trusted::perform_with(&runner, computation).ok(), Some(42));
}

#[test]
fn recording_runner_keeps_invocation_order_and_types() {
    let runner = RecordingRunner::default();
    let computation = Computation::attempt("7", |text: &str| text.len())
        .bind(|length| Computation::attempt(length, |length: usize| length as u64))
        .bind(|_| Computation::attempt((), |()| -> bool { panic!("gave up") }));

    let _ = trusted::perform_with(&runner, computation);

    assert_eq!(
        runner.records(),
        vec![
            EffectRecord {
                request_type: "&str",
                response_type: "usize",
                outcome: EffectOutcome::Succeeded,
            },
            EffectRecord {
                request_type: "usize",
                response_type: "u64",
                outcome: EffectOutcome::Succeeded,
            },
            EffectRecord {
                request_type: "()",
                response_type: "bool",
                outcome: EffectOutcome::Failed {
                    message: String::from("gave up"),
                },
            },
        ]
    );
}

#[test]
fn recording_runner_allows_nested_perform_from_an_operation() {
    let runner = Rc::new(RecordingRunner::default());
    let nested_runner = Rc::clone(&runner);

    let computation = Computation::attempt(3, move |n: i32| {
        let inner = Computation::attempt(n, |n: i32| n * n);
        trusted::perform_with(&*nested_runner, inner).unwrap_or_default()
    });

    assert_eq!(trusted::perform_with(&runner, computation).ok(), Some(9));
    assert_eq!(runner.invocations(), 2);
}

#[test]
fn recording_runner_wraps_a_custom_runner() {
    let runner = RecordingRunner::new(Stub { answer: 1 });
    let _ = trusted::perform_with(&runner, Computation::attempt(5_u32, |n: u32| n));
    let (_, records) = runner.into_parts();
    assert_eq!(
        records[0].outcome,
        EffectOutcome::Failed {
            message: String::from("stubbed 1")
        }
    );
}
