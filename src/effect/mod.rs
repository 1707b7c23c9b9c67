//! Deferred effects and the machinery that runs them.
//!
//! This module provides the [`Computation`] type, a lazy description of a
//! chain of possibly-failing effects, together with the pieces that execute
//! it:
//!
//! - [`Computation`]: construction and combinators (all deferred)
//! - [`Blueprint`]: a cloneable, thread-shareable recipe for computations
//! - [`EffectDescriptor`]: one suspended effect, as seen by a runner
//! - [`EffectRunner`]: the capability that calls wrapped operations
//! - [`DirectRunner`]: the default synchronous, panic-trapping runner
//! - [`RecordingRunner`]: a runner that logs every invocation
//! - [`Panic`]: a panic captured from a wrapped operation
//!
//! Execution entry points live in [`crate::trusted`].
//!
//! # Examples
//!
//! ```rust
//! use deferral::effect::Computation;
//! use deferral::trusted;
//!
//! let computation = Computation::attempt(3, |n: i32| n)
//!     .map(|n| n * 2)
//!     .bind(|n| Computation::attempt(n, |n: i32| n + 1));
//!
//! // Nothing has run yet
//! assert_eq!(trusted::perform(computation).ok(), Some(7));
//! ```
//!
//! # Choosing a Failure Representation
//!
//! ```rust
//! use deferral::effect::Computation;
//! use deferral::trusted;
//!
//! let build = || Computation::attempt((), |()| -> i32 { panic!("boom") });
//!
//! // As a value
//! assert_eq!(trusted::perform(build()).unwrap_err().message(), "boom");
//!
//! // As an option, dropping the failure
//! assert_eq!(trusted::perform_pure(build().caught_option()), None);
//! ```

mod blueprint;
mod combinator;
mod computation;
mod descriptor;
mod error;
pub(crate) mod interpreter;
mod panic;
mod runner;

pub use blueprint::Blueprint;
pub use computation::Computation;
pub use descriptor::{Continuations, EffectDescriptor, PendingCall, Resumption, Response};
pub use error::InvariantViolation;
pub use panic::{Panic, PanicPayload, Throwable};
pub use runner::{DirectRunner, EffectOutcome, EffectRecord, EffectRunner, RecordingRunner};
