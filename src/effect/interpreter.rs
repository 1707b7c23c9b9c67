//! Stack-safe interpretation of computations.
//!
//! A [`Computation`](super::Computation) is a typed facade over a [`Step`]
//! tree whose values and errors are type-erased. The interpreter walks that
//! tree in a loop with an explicit frame stack instead of recursing, so long
//! `bind` chains use constant call-stack depth.
//!
//! ```text
//! Step = Pure(value)
//!      | Fail(error)
//!      | Effect(suspended)
//!      | Defer(thunk)
//!      | Bind(source, continuation)
//!      | Handle(source, handler)
//! ```
//!
//! A value skips `Handle` frames until it reaches a `Bind` frame; an error
//! skips `Bind` frames until it reaches a `Handle` frame. An empty stack ends
//! the run.

use std::any::{Any, type_name};

use smallvec::SmallVec;

use super::descriptor::{Continuations, EffectDescriptor, PendingCall};
use super::error::InvariantViolation;
use super::panic::Panic;
use super::runner::EffectRunner;

/// A type-erased value or error.
pub(crate) type Erased = Box<dyn Any>;

/// A type-erased continuation between steps.
pub(crate) type Arrow = Box<dyn FnOnce(Erased) -> Step>;

const FRAME_INLINE_CAPACITY: usize = 8;

/// One node of a computation tree.
pub(crate) enum Step {
    Pure(Erased),
    Fail(Erased),
    Effect(Suspended),
    Defer(Box<dyn FnOnce() -> Step>),
    Bind(Source, Arrow),
    Handle(Source, Arrow),
}

impl Step {
    const fn is_nested(&self) -> bool {
        matches!(self, Self::Bind(..) | Self::Handle(..))
    }
}

/// The inner step of a `Bind` or `Handle` node.
///
/// Dropping a source unlinks nested sources into a work list, so a chain that
/// is never performed drops in constant call-stack depth.
pub(crate) struct Source(Box<Step>);

impl Source {
    pub(crate) fn new(step: Step) -> Self {
        Self(Box::new(step))
    }

    fn take(&mut self) -> Step {
        std::mem::replace(&mut *self.0, Step::Pure(Box::new(())))
    }

    fn into_step(mut self) -> Step {
        self.take()
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        if !self.0.is_nested() {
            return;
        }
        let mut pending = vec![self.take()];
        while let Some(mut step) = pending.pop() {
            if let Step::Bind(source, _) | Step::Handle(source, _) = &mut step
                && source.0.is_nested()
            {
                pending.push(source.take());
            }
        }
    }
}

/// How the failure continuation of a suspended effect treats a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureMode {
    /// The panic becomes a typed failure.
    Capture,
    /// The panic is re-raised.
    Rethrow,
}

/// A single wrapped operation awaiting a runner.
pub(crate) struct Suspended {
    call: PendingCall,
    failure: FailureMode,
}

impl Suspended {
    pub(crate) fn new<Req, Resp, F>(request: Req, operation: F, failure: FailureMode) -> Self
    where
        Req: 'static,
        Resp: 'static,
        F: FnOnce(Req) -> Resp + 'static,
    {
        Self {
            call: PendingCall::new(request, operation),
            failure,
        }
    }

    fn into_descriptor(self) -> EffectDescriptor {
        let continuations = match self.failure {
            FailureMode::Capture => {
                Continuations::new(|panic| Step::Fail(Box::new(panic)), Step::Pure)
            }
            FailureMode::Rethrow => Continuations::new(
                |panic: Panic| {
                    tracing::debug!(
                        message = panic.message(),
                        "trusted effect panicked, re-raising"
                    );
                    panic.resume()
                },
                Step::Pure,
            ),
        };
        EffectDescriptor::new(self.call, continuations)
    }
}

enum Frame {
    Bind(Arrow),
    Handle(Arrow),
}

type FrameStack = SmallVec<[Frame; FRAME_INLINE_CAPACITY]>;

/// Recovers a concrete value from its erased form.
///
/// A mismatch can only come from a bug in the typed facade and is fatal.
pub(crate) fn unerase<T: 'static>(value: Erased, context: &'static str) -> T {
    match value.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => InvariantViolation::TypeMismatch {
            context,
            expected: type_name::<T>(),
        }
        .raise(),
    }
}

fn next_bind(frames: &mut FrameStack) -> Option<Arrow> {
    while let Some(frame) = frames.pop() {
        if let Frame::Bind(continuation) = frame {
            return Some(continuation);
        }
    }
    None
}

fn next_handler(frames: &mut FrameStack) -> Option<Arrow> {
    while let Some(frame) = frames.pop() {
        if let Frame::Handle(handler) = frame {
            return Some(handler);
        }
    }
    None
}

/// Runs `step` to completion.
///
/// The runner is invoked once per `Effect` node reached, in evaluation order.
pub(crate) fn interpret<R>(runner: &R, step: Step) -> Result<Erased, Erased>
where
    R: EffectRunner + ?Sized,
{
    let mut frames = FrameStack::new();
    let mut current = step;

    loop {
        current = match current {
            Step::Pure(value) => match next_bind(&mut frames) {
                Some(continuation) => continuation(value),
                None => return Ok(value),
            },
            Step::Fail(error) => match next_handler(&mut frames) {
                Some(handler) => handler(error),
                None => return Err(error),
            },
            Step::Effect(suspended) => runner.run(suspended.into_descriptor()).0,
            Step::Defer(thunk) => thunk(),
            Step::Bind(source, continuation) => {
                frames.push(Frame::Bind(continuation));
                source.into_step()
            }
            Step::Handle(source, handler) => {
                frames.push(Frame::Handle(handler));
                source.into_step()
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::DirectRunner;
    use rstest::rstest;

    fn pure(value: i32) -> Step {
        Step::Pure(Box::new(value))
    }

    fn add(amount: i32) -> Arrow {
        Box::new(move |value| pure(unerase::<i32>(value, "test") + amount))
    }

    fn run(step: Step) -> Result<i32, String> {
        interpret(&DirectRunner, step)
            .map(|value| unerase::<i32>(value, "test"))
            .map_err(|error| unerase::<String>(error, "test"))
    }

    #[test]
    fn pure_step_returns_value() {
        assert_eq!(run(pure(3)), Ok(3));
    }

    #[test]
    fn bind_frames_apply_in_order() {
        let step = Step::Bind(Source::new(Step::Bind(Source::new(pure(1)), add(2))), add(3));
        assert_eq!(run(step), Ok(6));
    }

    #[test]
    fn failure_skips_bind_frames() {
        let failing = Step::Fail(Box::new(String::from("stop")));
        let step = Step::Bind(
            Source::new(failing),
            Box::new(|_: Erased| -> Step { panic!("must not run") }),
        );
        assert_eq!(run(step), Err(String::from("stop")));
    }

    #[test]
    fn success_skips_handle_frames() {
        let step = Step::Handle(
            Source::new(pure(5)),
            Box::new(|_: Erased| -> Step { panic!("must not run") }),
        );
        assert_eq!(run(step), Ok(5));
    }

    #[test]
    fn handler_resumes_after_failure() {
        let failing = Step::Fail(Box::new(String::from("stop")));
        let step = Step::Handle(Source::new(failing), Box::new(|_: Erased| pure(0)));
        assert_eq!(run(step), Ok(0));
    }

    #[test]
    fn defer_is_forced_by_interpreter() {
        let step = Step::Defer(Box::new(|| pure(9)));
        assert_eq!(run(step), Ok(9));
    }

    #[test]
    fn captured_effect_panic_becomes_failure() {
        let step = Step::Effect(Suspended::new(
            (),
            |()| -> i32 { panic!("boom") },
            FailureMode::Capture,
        ));
        let error = interpret(&DirectRunner, step)
            .err()
            .map(|error| unerase::<Panic>(error, "test"));
        assert_eq!(error.as_ref().map(Panic::message), Some("boom"));
    }

    #[rstest]
    #[case(10)]
    #[case(10_000)]
    #[case(200_000)]
    fn left_nested_binds_do_not_grow_the_call_stack(#[case] depth: i32) {
        let mut step = pure(0);
        for _ in 0..depth {
            step = Step::Bind(Source::new(step), add(1));
        }
        assert_eq!(run(step), Ok(depth));
    }

    #[test]
    fn unperformed_deep_chain_drops_without_growing_the_call_stack() {
        let mut step = pure(0);
        for depth in 0..200_000 {
            step = if depth % 2 == 0 {
                Step::Bind(Source::new(step), add(1))
            } else {
                Step::Handle(Source::new(step), Box::new(|_: Erased| pure(0)))
            };
        }
        drop(step);
    }

    #[test]
    #[should_panic(expected = "expected a value of type `u8`")]
    fn mismatched_erased_type_is_an_invariant_violation() {
        let _: u8 = unerase(Box::new(1_i32), "test");
    }
}
