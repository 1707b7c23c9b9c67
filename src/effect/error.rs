//! Error types for the effect system.
//!
//! These errors never flow through a computation's failure channel. They
//! describe broken internal invariants, which are fatal: they are logged and
//! then raised as a panic.

use thiserror::Error;

/// Represents a broken internal invariant of the interpreter.
///
/// Reaching one of these means a bug in the library or a computation forged
/// against its type contract, never an ordinary failure.
///
/// # Examples
///
/// ```rust
/// use deferral::effect::InvariantViolation;
///
/// let violation = InvariantViolation::UnexpectedFailure {
///     entry_point: "perform_pure",
/// };
/// assert_eq!(
///     format!("{violation}"),
///     "internal invariant violated: perform_pure reached its failure continuation \
///      although the computation cannot fail"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An erased value did not have the type its position promised.
    #[error("internal invariant violated: expected a value of type `{expected}` in {context}")]
    TypeMismatch {
        /// Where the mismatch was detected.
        context: &'static str,
        /// The type that position must hold.
        expected: &'static str,
    },
    /// A failure reached an entry point whose computation cannot fail.
    #[error(
        "internal invariant violated: {entry_point} reached its failure continuation \
         although the computation cannot fail"
    )]
    UnexpectedFailure {
        /// The perform entry point that observed the failure.
        entry_point: &'static str,
    },
}

impl InvariantViolation {
    /// Logs the violation and aborts the current computation by panicking.
    #[cold]
    #[track_caller]
    pub(crate) fn raise(self) -> ! {
        tracing::error!(violation = %self, "fatal interpreter invariant violation");
        panic!("{self}")
    }
}
