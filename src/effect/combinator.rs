//! Combinators over [`Computation`].
//!
//! Every combinator is pure: it wraps the existing computation in a new
//! node and runs nothing. Combinators only rewire which continuation sees a
//! value or an error, so the set and order of effects a computation runs is
//! unchanged by them.
//!
//! Functions passed to these combinators are treated as pure. A panic inside
//! one is not captured by the runner and unwinds out of the perform call.

use std::convert::Infallible;

use super::computation::Computation;
use super::interpreter::{Source, Step, unerase};

// =============================================================================
// Success Channel
// =============================================================================

impl<E: 'static, A: 'static> Computation<E, A> {
    /// Transforms the success value. Failures pass through untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    ///
    /// let computation = Computation::attempt(21, |n: i32| n).map(|n| n * 2);
    /// assert_eq!(trusted::perform(computation).ok(), Some(42));
    /// ```
    pub fn map<B, F>(self, function: F) -> Computation<E, B>
    where
        F: FnOnce(A) -> B + 'static,
        B: 'static,
    {
        Computation::from_step(Step::Bind(
            Source::new(self.into_step()),
            Box::new(move |value| {
                let value = unerase::<A>(value, "map function");
                Step::Pure(Box::new(function(value)))
            }),
        ))
    }

    /// Sequences this computation with one built from its result.
    ///
    /// On failure the continuation is never called and the failure is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    ///
    /// let computation = Computation::attempt(3, |n: i32| n)
    ///     .bind(|n| Computation::attempt(n * 2, |n: i32| n + 1));
    /// assert_eq!(trusted::perform(computation).ok(), Some(7));
    /// ```
    pub fn bind<B, F>(self, function: F) -> Computation<E, B>
    where
        F: FnOnce(A) -> Computation<E, B> + 'static,
        B: 'static,
    {
        Computation::from_step(Step::Bind(
            Source::new(self.into_step()),
            Box::new(move |value| function(unerase::<A>(value, "bind continuation")).into_step()),
        ))
    }

    /// Alias for [`bind`](Self::bind).
    #[inline]
    pub fn and_then<B, F>(self, function: F) -> Computation<E, B>
    where
        F: FnOnce(A) -> Computation<E, B> + 'static,
        B: 'static,
    {
        self.bind(function)
    }

    /// Runs `next` after this computation, discarding this one's value.
    pub fn then<B: 'static>(self, next: Computation<E, B>) -> Computation<E, B> {
        self.bind(move |_| next)
    }

    /// Combines two computations with a function, left to right.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    /// use std::convert::Infallible;
    ///
    /// let left: Computation<Infallible, i32> = Computation::of(10);
    /// let computation = left.map2(Computation::of(20), |a, b| a + b);
    /// assert_eq!(trusted::perform_pure(computation), 30);
    /// ```
    pub fn map2<B, C, F>(self, other: Computation<E, B>, function: F) -> Computation<E, C>
    where
        F: FnOnce(A, B) -> C + 'static,
        B: 'static,
        C: 'static,
    {
        self.bind(move |a| other.map(move |b| function(a, b)))
    }

    /// Combines two computations into a tuple, left to right.
    pub fn product<B: 'static>(self, other: Computation<E, B>) -> Computation<E, (A, B)> {
        self.map2(other, |a, b| (a, b))
    }
}

impl<E: 'static, F: 'static> Computation<E, F> {
    /// Applies the function this computation produces to the value `argument`
    /// produces.
    ///
    /// The function side runs first. If it fails, `argument` is never started.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    /// use std::convert::Infallible;
    ///
    /// let function: Computation<Infallible, fn(i32) -> i32> = Computation::of(|n| n + 1);
    /// let computation = function.ap(Computation::of(41));
    /// assert_eq!(trusted::perform_pure(computation), 42);
    /// ```
    pub fn ap<A, B>(self, argument: Computation<E, A>) -> Computation<E, B>
    where
        F: FnOnce(A) -> B,
        A: 'static,
        B: 'static,
    {
        self.bind(move |function| argument.map(function))
    }
}

impl<E: 'static, A: 'static> Computation<E, Computation<E, A>> {
    /// Removes one level of nesting.
    pub fn flatten(self) -> Computation<E, A> {
        self.bind(|inner| inner)
    }
}

impl<E: 'static, A: 'static> Computation<E, Result<A, E>> {
    /// Moves an `Err` produced as a value into the failure channel.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    ///
    /// let computation: Computation<String, Result<i32, String>> =
    ///     Computation::of(Err("rejected".to_string()));
    /// assert_eq!(trusted::perform(computation.absolve()), Err("rejected".to_string()));
    /// ```
    pub fn absolve(self) -> Computation<E, A> {
        self.bind(Computation::from_result)
    }
}

// =============================================================================
// Failure Channel
// =============================================================================

impl<E: 'static, A: 'static> Computation<E, A> {
    /// Transforms the failure value. Success passes through untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    ///
    /// let computation = Computation::attempt((), |()| -> i32 { panic!("boom") })
    ///     .map_e(|panic| format!("wrapped: {panic}"));
    /// assert_eq!(trusted::perform(computation), Err("wrapped: boom".to_string()));
    /// ```
    pub fn map_e<E2, G>(self, function: G) -> Computation<E2, A>
    where
        G: FnOnce(E) -> E2 + 'static,
        E2: 'static,
    {
        Computation::from_step(Step::Handle(
            Source::new(self.into_step()),
            Box::new(move |error| {
                let error = unerase::<E>(error, "map_e function");
                Step::Fail(Box::new(function(error)))
            }),
        ))
    }

    /// Widens the failure type through its `From` conversion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::{Computation, Panic};
    /// use deferral::trusted;
    ///
    /// let computation = Computation::attempt((), |()| -> i32 { panic!("boom") });
    /// let widened: Computation<Box<dyn std::error::Error>, i32> = computation.forget_e();
    /// assert_eq!(trusted::perform(widened).unwrap_err().to_string(), "boom");
    /// ```
    pub fn forget_e<E2>(self) -> Computation<E2, A>
    where
        E2: From<E> + 'static,
    {
        self.map_e(E2::from)
    }

    /// Handles a failure by continuing with another computation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    /// use std::convert::Infallible;
    ///
    /// let computation = Computation::attempt((), |()| -> i32 { panic!("boom") })
    ///     .recover(|_| Computation::<Infallible, i32>::of(0));
    /// assert_eq!(trusted::perform_pure(computation), 0);
    /// ```
    pub fn recover<E2, H>(self, handler: H) -> Computation<E2, A>
    where
        H: FnOnce(E) -> Computation<E2, A> + 'static,
        E2: 'static,
    {
        Computation::from_step(Step::Handle(
            Source::new(self.into_step()),
            Box::new(move |error| handler(unerase::<E>(error, "recover handler")).into_step()),
        ))
    }

    /// Turns the outcome into a successful `Result`. The new computation
    /// cannot fail.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Computation;
    /// use deferral::trusted;
    ///
    /// let failing: Computation<String, i32> = Computation::fail("e".to_string());
    /// assert_eq!(trusted::perform_pure(failing.caught()), Err("e".to_string()));
    /// ```
    pub fn caught(self) -> Computation<Infallible, Result<A, E>> {
        self.map(Ok).recover(|error| Computation::of(Err(error)))
    }

    /// Turns the outcome into an `Option`, dropping the failure value. The new
    /// computation cannot fail.
    pub fn caught_option(self) -> Computation<Infallible, Option<A>> {
        self.map(Some).recover(|_| Computation::of(None))
    }
}

impl<A: 'static> Computation<Infallible, A> {
    /// Embeds a computation that cannot fail into any failure type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::{Computation, Panic};
    /// use deferral::trusted;
    ///
    /// let safe = Computation::of(2).widen::<Panic>();
    /// let computation = safe.bind(|n| Computation::attempt(n, |n: i32| n * 10));
    /// assert_eq!(trusted::perform(computation).ok(), Some(20));
    /// ```
    pub fn widen<E2: 'static>(self) -> Computation<E2, A> {
        self.map_e(|never| match never {})
    }
}
