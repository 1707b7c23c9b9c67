//! # deferral
//!
//! Deferred, composable, possibly-failing effects with explicit execution.
//!
//! ## Overview
//!
//! A [`Computation<E, A>`](effect::Computation) describes a chain of effects
//! that has not run yet. Wrapping an operation, mapping over it, or sequencing
//! it with another computation only builds a new description. Effects run when
//! the computation is handed to one of the perform functions in [`trusted`],
//! which returns the outcome in the shape the caller asks for.
//!
//! - **Untrusted operations** ([`Computation::attempt`](effect::Computation::attempt)):
//!   a panic becomes a typed [`Panic`](effect::Panic) failure.
//! - **Trusted operations** ([`trusted::operation`]): the caller asserts the
//!   operation cannot panic; if it does, the panic escapes the perform call.
//! - **Runners** ([`EffectRunner`](effect::EffectRunner)): the injectable
//!   capability that calls each wrapped operation.
//!
//! ## Example
//!
//! ```rust
//! use deferral::prelude::*;
//!
//! let computation = Computation::attempt(5, |n: i32| n * 2)
//!     .bind(|n| Computation::attempt(n, |n: i32| n + 1));
//!
//! assert_eq!(trusted::perform(computation).ok(), Some(11));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use deferral::prelude::*;
/// ```
pub mod prelude {
    pub use crate::effect::*;
    pub use crate::trusted;
}

pub mod effect;
pub mod trusted;
