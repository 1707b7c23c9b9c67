//! Effect runners: the capability that actually calls wrapped operations.
//!
//! A runner receives one [`EffectDescriptor`] at a time. It must call the
//! descriptor's operation inside a guarded scope and then invoke exactly one
//! of its continuations: `succeed` with the response on normal return, or
//! `fail` with the captured [`Panic`] on unwind. The runner returns whatever
//! that continuation returns.
//!
//! [`DirectRunner`] is the default. [`RecordingRunner`] wraps another runner
//! and keeps a log of every invocation, which is useful in tests.
//!
//! Guarding relies on unwinding; with `panic = "abort"` a panicking operation
//! terminates the process instead of becoming a typed failure.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;

use static_assertions::{assert_impl_all, assert_obj_safe};

use super::descriptor::{EffectDescriptor, Resumption};
use super::panic::Panic;

/// Runs effect descriptors.
///
/// # Contract
///
/// For each descriptor, call the operation, trap any panic it raises, and
/// resume with exactly one continuation. [`Continuations`](super::Continuations)
/// consumes itself on use, so invoking both is impossible.
///
/// # Examples
///
/// ```rust
/// use deferral::effect::{Computation, EffectDescriptor, EffectRunner, Panic, Resumption};
/// use deferral::trusted;
///
/// /// Fails every effect without calling it.
/// struct Offline;
///
/// impl EffectRunner for Offline {
///     fn run(&self, descriptor: EffectDescriptor) -> Resumption {
///         let (_, continuations) = descriptor.split();
///         continuations.fail(Panic::from_message("offline"))
///     }
/// }
///
/// let computation = Computation::attempt("/status", |path: &str| path.len());
/// let error = trusted::perform_with(&Offline, computation).unwrap_err();
/// assert_eq!(error.message(), "offline");
/// ```
pub trait EffectRunner {
    /// Runs one descriptor and returns the resumed interpreter state.
    fn run(&self, descriptor: EffectDescriptor) -> Resumption;
}

assert_obj_safe!(EffectRunner);

impl<R: EffectRunner + ?Sized> EffectRunner for &R {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        (**self).run(descriptor)
    }
}

impl<R: EffectRunner + ?Sized> EffectRunner for Box<R> {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        (**self).run(descriptor)
    }
}

impl<R: EffectRunner + ?Sized> EffectRunner for Rc<R> {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        (**self).run(descriptor)
    }
}

impl<R: EffectRunner + ?Sized> EffectRunner for Arc<R> {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        (**self).run(descriptor)
    }
}

// =============================================================================
// DirectRunner
// =============================================================================

/// Calls each operation synchronously on the current thread.
///
/// Panics raised by the operation are caught with `catch_unwind` and passed
/// to the failure continuation. The runner holds no state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirectRunner;

assert_impl_all!(DirectRunner: Send, Sync, Copy, Default);

impl EffectRunner for DirectRunner {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        let (call, continuations) = descriptor.split();
        let request_type = call.request_type();
        let response_type = call.response_type();
        tracing::trace!(request_type, response_type, "running effect");

        // The call is consumed by the closure and never observed after an unwind.
        match catch_unwind(AssertUnwindSafe(move || call.invoke())) {
            Ok(response) => continuations.succeed(response),
            Err(payload) => {
                let panic = Panic::new(payload);
                tracing::debug!(
                    request_type,
                    message = panic.message(),
                    "effect panicked"
                );
                continuations.fail(panic)
            }
        }
    }
}

// =============================================================================
// RecordingRunner
// =============================================================================

/// How a recorded invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    /// The operation returned normally.
    Succeeded,
    /// The operation panicked and the panic became a typed failure.
    Failed {
        /// The panic message.
        message: String,
    },
    /// The invocation did not return, because a trusted effect re-raised its
    /// panic or the inner runner itself panicked.
    Unwound,
}

/// One invocation seen by a [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectRecord {
    /// Type name of the request.
    pub request_type: &'static str,
    /// Type name of the response.
    pub response_type: &'static str,
    /// How the invocation ended.
    pub outcome: EffectOutcome,
}

/// A runner that delegates to another runner and records every invocation.
///
/// # Examples
///
/// ```rust
/// use deferral::effect::{Computation, EffectOutcome, RecordingRunner};
/// use deferral::trusted;
///
/// let runner = RecordingRunner::default();
/// let computation = Computation::attempt(3, |n: i32| n * 2)
///     .bind(|n| Computation::attempt(n, |n: i32| n + 1));
///
/// assert_eq!(trusted::perform_with(&runner, computation).ok(), Some(7));
/// assert_eq!(runner.invocations(), 2);
/// assert!(runner.records().iter().all(|record| record.outcome == EffectOutcome::Succeeded));
/// ```
#[derive(Debug)]
pub struct RecordingRunner<R = DirectRunner> {
    inner: R,
    journal: RefCell<Journal>,
}

/// Records keyed by a sequence number that `clear` never resets, so an
/// invocation still in flight finds its own entry or none.
#[derive(Debug)]
struct Journal {
    next_sequence: u64,
    entries: Vec<(u64, EffectRecord)>,
}

impl Journal {
    const fn new() -> Self {
        Self {
            next_sequence: 0,
            entries: Vec::new(),
        }
    }

    fn open(&mut self, record: EffectRecord) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push((sequence, record));
        sequence
    }

    fn close(&mut self, sequence: u64, outcome: EffectOutcome) {
        if let Some((_, record)) = self
            .entries
            .iter_mut()
            .rfind(|(entry, _)| *entry == sequence)
        {
            record.outcome = outcome;
        }
    }
}

impl<R> RecordingRunner<R> {
    /// Wraps `inner`.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            journal: RefCell::new(Journal::new()),
        }
    }

    /// Returns a snapshot of the records, in invocation order.
    pub fn records(&self) -> Vec<EffectRecord> {
        self.journal
            .borrow()
            .entries
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Returns how many descriptors have been run since the last `clear`.
    pub fn invocations(&self) -> usize {
        self.journal.borrow().entries.len()
    }

    /// Forgets every record.
    ///
    /// May be called from inside a running operation; invocations still in
    /// flight then leave no record behind.
    pub fn clear(&self) {
        self.journal.borrow_mut().entries.clear();
    }

    /// Releases the inner runner and the records.
    pub fn into_parts(self) -> (R, Vec<EffectRecord>) {
        let records = self
            .journal
            .into_inner()
            .entries
            .into_iter()
            .map(|(_, record)| record)
            .collect();
        (self.inner, records)
    }
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new(DirectRunner)
    }
}

impl<R: EffectRunner> EffectRunner for RecordingRunner<R> {
    fn run(&self, descriptor: EffectDescriptor) -> Resumption {
        let sequence = self.journal.borrow_mut().open(EffectRecord {
            request_type: descriptor.request_type(),
            response_type: descriptor.response_type(),
            outcome: EffectOutcome::Unwound,
        });

        // No borrow is held here: the operation may perform with this runner.
        let resumption = self.inner.run(descriptor);

        let outcome = resumption
            .captured_panic()
            .map_or(EffectOutcome::Succeeded, |panic| EffectOutcome::Failed {
                message: panic.message().to_owned(),
            });
        self.journal.borrow_mut().close(sequence, outcome);
        resumption
    }
}
