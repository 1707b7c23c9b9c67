//! Trusted construction and the perform family.
//!
//! This is the only place where computations are executed. Each perform
//! function hands the computation to an [`EffectRunner`] and converts the
//! outcome into a directly usable shape:
//!
//! | Function | Result |
//! |---|---|
//! | [`perform`] | `Result<A, E>` |
//! | [`perform_throwing`] | `A`, re-raising a failure as a panic |
//! | [`perform_pure`] | `A`, for computations that cannot fail |
//!
//! Each has a `_with` variant that takes the runner explicitly. The plain
//! variants use [`DirectRunner`].
//!
//! # Trusted operations
//!
//! [`operation`] wraps an operation the caller asserts cannot panic. No
//! failure is tracked in its type. If the assertion is wrong, the panic is
//! re-raised when the computation is performed and unwinds out of the
//! perform call instead of becoming a typed failure.
//!
//! # Examples
//!
//! ```rust
//! use deferral::effect::Computation;
//! use deferral::trusted;
//!
//! let now = trusted::operation((), |()| 1_700_000_000_u64);
//! let computation = now
//!     .widen()
//!     .bind(|seconds| Computation::attempt(seconds, |seconds: u64| seconds / 60));
//!
//! assert_eq!(trusted::perform(computation).ok(), Some(28_333_333));
//! ```

use std::convert::Infallible;

use crate::effect::interpreter::{FailureMode, Step, Suspended, interpret, unerase};
use crate::effect::{Computation, DirectRunner, EffectRunner, InvariantViolation, Throwable};

/// Wraps an operation asserted never to panic.
///
/// The resulting computation cannot fail in its type. A panic raised by
/// `operation` despite the assertion is re-raised when performed.
///
/// # Examples
///
/// ```rust
/// use deferral::trusted;
/// use std::panic::{AssertUnwindSafe, catch_unwind};
///
/// let broken = trusted::operation((), |()| -> i32 { panic!("boom") });
/// let outcome = catch_unwind(AssertUnwindSafe(|| trusted::perform_pure(broken)));
/// assert!(outcome.is_err());
/// ```
pub fn operation<Req, Resp, F>(request: Req, operation: F) -> Computation<Infallible, Resp>
where
    Req: 'static,
    Resp: 'static,
    F: FnOnce(Req) -> Resp + 'static,
{
    Computation::from_step(Step::Effect(Suspended::new(
        request,
        operation,
        FailureMode::Rethrow,
    )))
}

/// Wraps a request-less operation asserted never to panic.
pub fn suspend<Resp, F>(thunk: F) -> Computation<Infallible, Resp>
where
    Resp: 'static,
    F: FnOnce() -> Resp + 'static,
{
    operation((), move |()| thunk())
}

/// Performs a computation with [`DirectRunner`].
///
/// Typed failures are returned as `Err`, never raised.
///
/// # Examples
///
/// ```rust
/// use deferral::effect::Computation;
/// use deferral::trusted;
///
/// let computation = Computation::attempt((), |()| -> i32 { panic!("boom") });
/// assert_eq!(trusted::perform(computation).unwrap_err().message(), "boom");
/// ```
pub fn perform<E: 'static, A: 'static>(computation: Computation<E, A>) -> Result<A, E> {
    perform_with(&DirectRunner, computation)
}

/// Performs a computation with the given runner.
pub fn perform_with<R, E, A>(runner: &R, computation: Computation<E, A>) -> Result<A, E>
where
    R: EffectRunner + ?Sized,
    E: 'static,
    A: 'static,
{
    match interpret(runner, computation.into_step()) {
        Ok(value) => Ok(unerase::<A>(value, "final result")),
        Err(error) => Err(unerase::<E>(error, "final failure")),
    }
}

/// Performs a computation with [`DirectRunner`], raising a failure as a panic.
///
/// # Examples
///
/// ```rust
/// use deferral::effect::Computation;
/// use deferral::trusted;
/// use std::panic::{AssertUnwindSafe, catch_unwind};
///
/// let computation = Computation::attempt((), |()| -> i32 { panic!("boom") });
/// let payload = catch_unwind(AssertUnwindSafe(|| trusted::perform_throwing(computation)))
///     .unwrap_err();
/// assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
/// ```
pub fn perform_throwing<E, A>(computation: Computation<E, A>) -> A
where
    E: Throwable + 'static,
    A: 'static,
{
    perform_throwing_with(&DirectRunner, computation)
}

/// Performs a computation with the given runner, raising a failure as a panic.
pub fn perform_throwing_with<R, E, A>(runner: &R, computation: Computation<E, A>) -> A
where
    R: EffectRunner + ?Sized,
    E: Throwable + 'static,
    A: 'static,
{
    match perform_with(runner, computation) {
        Ok(value) => value,
        Err(error) => {
            tracing::debug!(
                error_type = std::any::type_name::<E>(),
                "computation failed, raising"
            );
            error.throw()
        }
    }
}

/// Performs a computation that cannot fail with [`DirectRunner`].
///
/// # Panics
///
/// Panics if a trusted operation panics, re-raising its payload. Panics with
/// an [`InvariantViolation`] diagnostic if a failure reaches this call, which
/// the type of `computation` rules out.
///
/// # Examples
///
/// ```rust
/// use deferral::trusted;
///
/// let computation = trusted::operation(5, |n: i32| n * 2).map(|n| n + 1);
/// assert_eq!(trusted::perform_pure(computation), 11);
/// ```
pub fn perform_pure<A: 'static>(computation: Computation<Infallible, A>) -> A {
    perform_pure_with(&DirectRunner, computation)
}

/// Performs a computation that cannot fail with the given runner.
///
/// # Panics
///
/// See [`perform_pure`].
pub fn perform_pure_with<R, A>(runner: &R, computation: Computation<Infallible, A>) -> A
where
    R: EffectRunner + ?Sized,
    A: 'static,
{
    match interpret(runner, computation.into_step()) {
        Ok(value) => unerase::<A>(value, "final result"),
        Err(_) => InvariantViolation::UnexpectedFailure {
            entry_point: "perform_pure",
        }
        .raise(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Panic, RecordingRunner};
    use rstest::rstest;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn unwound_message<F: FnOnce()>(function: F) -> String {
        let payload = catch_unwind(AssertUnwindSafe(function)).unwrap_err();
        Panic::new(payload).message().to_owned()
    }

    #[test]
    fn trusted_operation_runs_through_runner() {
        let runner = RecordingRunner::default();
        let computation = operation(2, |n: i32| n + 40);
        assert_eq!(perform_pure_with(&runner, computation), 42);
        assert_eq!(runner.invocations(), 1);
    }

    #[test]
    fn trusted_panic_escapes_perform_pure() {
        let computation = operation((), |()| -> i32 { panic!("boom") });
        assert_eq!(unwound_message(|| { perform_pure(computation); }), "boom");
    }

    #[test]
    fn trusted_panic_escapes_perform_even_inside_caught() {
        let computation = suspend(|| -> i32 { panic!("boom") }).widen::<String>().caught();
        assert_eq!(unwound_message(|| { perform_pure(computation); }), "boom");
    }

    #[rstest]
    #[case::panic(Computation::attempt((), |()| -> i32 { panic!("boom") }), "boom")]
    #[case::explicit(Computation::fail(Panic::from_message("declared")), "declared")]
    fn perform_throwing_raises_failure(
        #[case] computation: Computation<Panic, i32>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            unwound_message(|| { perform_throwing(computation); }),
            expected
        );
    }

    #[test]
    fn perform_throwing_returns_success() {
        let computation: Computation<String, i32> = Computation::of(5);
        assert_eq!(perform_throwing(computation), 5);
    }

    #[test]
    fn perform_throwing_raises_string_failures() {
        let computation: Computation<String, i32> = Computation::fail("declared".to_string());
        assert_eq!(unwound_message(|| { perform_throwing(computation); }), "declared");
    }

    #[test]
    fn forged_failure_in_perform_pure_is_an_invariant_violation() {
        // Only a bug inside the crate can produce this step for an infallible computation.
        let forged: Computation<Infallible, i32> =
            Computation::from_step(Step::Fail(Box::new("forged")));
        let message = unwound_message(|| { perform_pure(forged); });
        assert!(message.contains("perform_pure reached its failure continuation"));
    }
}
