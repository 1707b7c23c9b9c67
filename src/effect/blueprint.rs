//! Reusable, thread-shareable recipes for computations.
//!
//! A [`Computation`] owns its continuations and is consumed when performed.
//! A [`Blueprint`] holds the function that builds one instead, so it can be
//! cloned, cached, and sent to other threads. Each [`Blueprint::build`] yields
//! a fresh computation, and performing it runs every effect again; results
//! are never memoized.
//!
//! # Examples
//!
//! ```rust
//! use deferral::effect::{Blueprint, Computation};
//! use deferral::trusted;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! let blueprint = Blueprint::new(move || {
//!     let counter = Arc::clone(&counter);
//!     Computation::suspend(move || counter.fetch_add(1, Ordering::SeqCst) + 1)
//! });
//!
//! assert_eq!(trusted::perform(blueprint.build()).ok(), Some(1));
//! assert_eq!(trusted::perform(blueprint.build()).ok(), Some(2));
//! assert_eq!(calls.load(Ordering::SeqCst), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use static_assertions::assert_impl_all;

use super::computation::Computation;
use super::panic::Panic;

type Builder<E, A> = dyn Fn() -> Computation<E, A> + Send + Sync;

/// A shareable recipe that builds a [`Computation`] on demand.
pub struct Blueprint<E, A> {
    builder: Arc<Builder<E, A>>,
}

assert_impl_all!(Blueprint<Panic, i32>: Clone, Send, Sync);

impl<E: 'static, A: 'static> Blueprint<E, A> {
    /// Creates a blueprint from a builder function.
    ///
    /// The builder runs once per performed computation, not at construction.
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn() -> Computation<E, A> + Send + Sync + 'static,
    {
        Self {
            builder: Arc::new(builder),
        }
    }

    /// Returns a fresh computation.
    ///
    /// The builder itself is deferred until the computation is performed.
    #[must_use]
    pub fn build(&self) -> Computation<E, A> {
        let builder = Arc::clone(&self.builder);
        Computation::defer(move || builder())
    }
}

impl<E, A> Clone for Blueprint<E, A> {
    fn clone(&self) -> Self {
        Self {
            builder: Arc::clone(&self.builder),
        }
    }
}

impl<E, A> fmt::Debug for Blueprint<E, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Blueprint<{}, {}>",
            std::any::type_name::<E>(),
            std::any::type_name::<A>()
        )
    }
}
