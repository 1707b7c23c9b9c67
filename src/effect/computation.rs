//! Computation - deferred, possibly-failing effects.
//!
//! A [`Computation<E, A>`] describes a chain of effects that, once performed,
//! produces a value of type `A` or fails with a value of type `E`. Building
//! and composing computations never runs anything. Execution happens only
//! through the perform family in [`crate::trusted`].
//!
//! # Construction
//!
//! - [`Computation::of`]: an already-known value
//! - [`Computation::fail`]: an already-known failure
//! - [`Computation::attempt`]: an operation whose panics become typed failures
//! - [`crate::trusted::operation`]: an operation asserted never to panic
//!
//! # Examples
//!
//! ```rust
//! use deferral::effect::Computation;
//! use deferral::trusted;
//!
//! let computation = Computation::attempt(5, |n: i32| n * 2);
//! assert_eq!(trusted::perform(computation).ok(), Some(10));
//!
//! let failing = Computation::attempt(5, |_: i32| -> i32 { panic!("boom") });
//! assert_eq!(trusted::perform(failing).unwrap_err().message(), "boom");
//! ```
//!
//! # Side Effect Deferral
//!
//! ```rust
//! use deferral::effect::Computation;
//! use deferral::trusted;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let calls = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&calls);
//!
//! let computation = Computation::suspend(move || {
//!     counter.set(counter.get() + 1);
//!     42
//! })
//! .map(|x| x + 1);
//!
//! // Not executed yet
//! assert_eq!(calls.get(), 0);
//!
//! assert_eq!(trusted::perform(computation).ok(), Some(43));
//! assert_eq!(calls.get(), 1);
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::interpreter::{FailureMode, Step, Suspended};
use super::panic::Panic;

/// A deferred computation that succeeds with `A` or fails with `E`.
///
/// The error type is a type-level tag: at run time a failure is a value
/// handed to the failure path, never an unwind, unless the computation was
/// built on the trusted path.
///
/// A computation is consumed when performed. Performing a freshly built
/// computation twice runs its effects twice; nothing is memoized. Use a
/// [`Blueprint`](super::Blueprint) to share or reuse one.
///
/// # Type Parameters
///
/// - `E`: The failure type. [`Infallible`](std::convert::Infallible) marks a
///   computation that cannot fail.
/// - `A`: The success type.
///
/// # Monad Laws
///
/// `Computation` satisfies the monad laws:
///
/// 1. **Left Identity**: `Computation::of(a).bind(f) == f(a)`
/// 2. **Right Identity**: `m.bind(Computation::of) == m`
/// 3. **Associativity**: `m.bind(f).bind(g) == m.bind(|x| f(x).bind(g))`
pub struct Computation<E, A> {
    step: Step,
    _types: PhantomData<fn() -> (E, A)>,
}

impl<E, A> Computation<E, A> {
    pub(crate) fn from_step(step: Step) -> Self {
        Self {
            step,
            _types: PhantomData,
        }
    }

    pub(crate) fn into_step(self) -> Step {
        self.step
    }
}

impl<E: 'static, A: 'static> Computation<E, A> {
    /// Wraps an already-known value.
    ///
    /// Performing it never touches the runner.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    /// use std::convert::Infallible;
    ///
    /// let computation: Computation<Infallible, i32> = Computation::of(42);
    /// assert_eq!(trusted::perform_pure(computation), 42);
    /// ```
    pub fn of(value: A) -> Self {
        Self::from_step(Step::Pure(Box::new(value)))
    }

    /// Alias for [`of`](Self::of).
    #[inline]
    pub fn pure(value: A) -> Self {
        Self::of(value)
    }

    /// Wraps an already-known failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    ///
    /// let computation: Computation<String, i32> = Computation::fail("no".to_string());
    /// assert_eq!(trusted::perform(computation), Err("no".to_string()));
    /// ```
    pub fn fail(error: E) -> Self {
        Self::from_step(Step::Fail(Box::new(error)))
    }

    /// Lifts a `Result` into a computation.
    pub fn from_result(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => Self::of(value),
            Err(error) => Self::fail(error),
        }
    }

    /// Defers building a computation until it is performed.
    ///
    /// Useful for recursive definitions, which would otherwise build the
    /// whole chain eagerly.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    /// use std::convert::Infallible;
    ///
    /// fn count_down(n: u64) -> Computation<Infallible, u64> {
    ///     if n == 0 {
    ///         Computation::of(0)
    ///     } else {
    ///         Computation::defer(move || count_down(n - 1))
    ///     }
    /// }
    ///
    /// assert_eq!(trusted::perform_pure(count_down(100_000)), 0);
    /// ```
    pub fn defer<F>(thunk: F) -> Self
    where
        F: FnOnce() -> Self + 'static,
    {
        Self::from_step(Step::Defer(Box::new(move || thunk().step)))
    }
}

impl<A: 'static> Computation<Panic, A> {
    /// Wraps an operation whose panics become typed failures.
    ///
    /// `operation(request)` is not called until the computation is performed.
    /// A normal return becomes success; a panic becomes a [`Panic`] failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    ///
    /// let parse = Computation::attempt("12x", |text: &str| text.parse::<i32>().unwrap());
    /// let error = trusted::perform(parse).unwrap_err();
    /// assert!(error.message().contains("InvalidDigit"));
    /// ```
    pub fn attempt<Req, F>(request: Req, operation: F) -> Self
    where
        Req: 'static,
        F: FnOnce(Req) -> A + 'static,
    {
        Self::from_step(Step::Effect(Suspended::new(
            request,
            operation,
            FailureMode::Capture,
        )))
    }

    /// Wraps a request-less operation whose panics become typed failures.
    pub fn suspend<F>(thunk: F) -> Self
    where
        F: FnOnce() -> A + 'static,
    {
        Self::attempt((), move |()| thunk())
    }
}

impl<E, A> fmt::Debug for Computation<E, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Computation<{}, {}>",
            std::any::type_name::<E>(),
            std::any::type_name::<A>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trusted;
    use std::convert::Infallible;

    #[test]
    fn of_succeeds_with_value() {
        let computation: Computation<String, i32> = Computation::of(42);
        assert_eq!(trusted::perform(computation), Ok(42));
    }

    #[test]
    fn fail_fails_with_error() {
        let computation: Computation<String, i32> = Computation::fail("bad".to_string());
        assert_eq!(trusted::perform(computation), Err("bad".to_string()));
    }

    #[test]
    fn from_result_keeps_classification() {
        let ok: Computation<&str, i32> = Computation::from_result(Ok(1));
        let err: Computation<&str, i32> = Computation::from_result(Err("e"));
        assert_eq!(trusted::perform(ok), Ok(1));
        assert_eq!(trusted::perform(err), Err("e"));
    }

    #[test]
    fn attempt_passes_request_to_operation() {
        let computation = Computation::attempt(5, |n: i32| n * 2);
        assert_eq!(trusted::perform(computation).ok(), Some(10));
    }

    #[test]
    fn attempt_captures_panic_message() {
        let computation = Computation::attempt(5, |_: i32| -> i32 { panic!("boom") });
        assert_eq!(trusted::perform(computation).unwrap_err().message(), "boom");
    }

    #[test]
    fn suspend_runs_thunk() {
        let computation = Computation::suspend(|| "done");
        assert_eq!(trusted::perform(computation).ok(), Some("done"));
    }

    #[test]
    fn defer_builds_lazily() {
        let computation: Computation<Infallible, i32> =
            Computation::defer(|| panic!("built too early"));
        drop(computation);
    }

    #[test]
    fn debug_shows_type_parameters() {
        let computation: Computation<String, i32> = Computation::of(1);
        assert_eq!(
            format!("{computation:?}"),
            "Computation<alloc::string::String, i32>"
        );
    }
}
