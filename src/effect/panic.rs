//! Captured panics and the `Throwable` capability.
//!
//! A panic is Rust's native abnormal termination. When an untrusted operation
//! panics while being run, the runner traps the unwind and hands the payload
//! to the failure continuation as a [`Panic`] value.
//!
//! # Examples
//!
//! ```rust
//! use deferral::effect::Panic;
//!
//! let panic = Panic::from_message("boom");
//! assert_eq!(panic.message(), "boom");
//! assert_eq!(format!("{panic}"), "boom");
//! ```

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::{panic_any, resume_unwind};

/// The payload carried by an unwinding panic.
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// A panic captured from a wrapped operation.
///
/// Holds the original unwind payload so the panic can be re-raised
/// unchanged with [`Panic::resume`].
pub struct Panic {
    payload: PanicPayload,
    rendered: Option<String>,
}

/// A boxed error raised through [`Throwable`].
type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Panic {
    /// Wraps a payload obtained from `std::panic::catch_unwind`.
    pub fn new(payload: PanicPayload) -> Self {
        let rendered = payload.downcast_ref::<BoxedError>().map(ToString::to_string);
        Self { payload, rendered }
    }

    /// Builds a panic value carrying a plain message, without unwinding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::Panic;
    ///
    /// let panic = Panic::from_message(String::from("disk full"));
    /// assert_eq!(panic.message(), "disk full");
    /// ```
    pub fn from_message<S: Into<String>>(message: S) -> Self {
        Self::new(Box::new(message.into()))
    }

    /// Returns the panic message.
    ///
    /// Payloads raised by `panic!` are either `&'static str` or `String`.
    /// A boxed error thrown with [`Throwable::throw`] yields its `Display`
    /// text. Any other payload type yields `"Unknown panic"`.
    pub fn message(&self) -> &str {
        if let Some(message) = self.payload.downcast_ref::<&'static str>() {
            message
        } else if let Some(message) = self.payload.downcast_ref::<String>() {
            message.as_str()
        } else if let Some(rendered) = &self.rendered {
            rendered.as_str()
        } else {
            "Unknown panic"
        }
    }

    /// Borrows the raw payload.
    pub fn payload(&self) -> &(dyn Any + Send) {
        self.payload.as_ref()
    }

    /// Releases the raw payload.
    pub fn into_payload(self) -> PanicPayload {
        self.payload
    }

    /// Re-raises the original panic on the current thread.
    pub fn resume(self) -> ! {
        resume_unwind(self.payload)
    }
}

impl fmt::Debug for Panic {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Panic")
            .field("message", &self.message())
            .finish()
    }
}

impl fmt::Display for Panic {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.message())
    }
}

impl std::error::Error for Panic {}

/// A failure type that can be raised as a native panic.
///
/// `perform_throwing` requires the error channel to implement this trait.
///
/// # Examples
///
/// ```rust
/// use deferral::effect::Throwable;
/// use std::panic::catch_unwind;
///
/// let result: Result<(), _> = catch_unwind(|| String::from("bad input").throw());
/// let payload = result.unwrap_err();
/// assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("bad input"));
/// ```
pub trait Throwable {
    /// Raises `self` as a panic.
    fn throw(self) -> !;
}

impl Throwable for Panic {
    fn throw(self) -> ! {
        self.resume()
    }
}

impl Throwable for String {
    fn throw(self) -> ! {
        panic_any(self)
    }
}

impl Throwable for &'static str {
    fn throw(self) -> ! {
        panic_any(self)
    }
}

impl Throwable for BoxedError {
    fn throw(self) -> ! {
        panic_any(self)
    }
}

impl Throwable for Infallible {
    fn throw(self) -> ! {
        match self {}
    }
}
