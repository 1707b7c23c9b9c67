//! Effect descriptors: one unit of deferred work.
//!
//! An [`EffectDescriptor`] pairs a request, the operation that turns it into
//! a response, and the two continuations that decide what happens next. The
//! interpreter builds a fresh descriptor each time it reaches a suspended
//! effect and hands it to an [`EffectRunner`](super::EffectRunner), which
//! consumes it exactly once.
//!
//! The request and response are type-erased at this boundary so that runners
//! stay object safe. Their type names remain available for instrumentation.

use std::any::Any;
use std::fmt;

use super::interpreter::{Erased, Step};
use super::panic::Panic;

/// One suspended effect, ready to be run.
///
/// Use [`split`](Self::split) to obtain the call and its continuations.
pub struct EffectDescriptor {
    call: PendingCall,
    continuations: Continuations,
}

impl EffectDescriptor {
    pub(crate) fn new(call: PendingCall, continuations: Continuations) -> Self {
        Self {
            call,
            continuations,
        }
    }

    /// Returns the type name of the request.
    pub const fn request_type(&self) -> &'static str {
        self.call.request_type
    }

    /// Returns the type name of the response the operation produces.
    pub const fn response_type(&self) -> &'static str {
        self.call.response_type
    }

    /// Borrows the request.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferral::effect::{Computation, DirectRunner, EffectDescriptor, EffectRunner, Resumption};
    /// use deferral::trusted;
    ///
    /// struct InspectingRunner;
    ///
    /// impl EffectRunner for InspectingRunner {
    ///     fn run(&self, descriptor: EffectDescriptor) -> Resumption {
    ///         assert_eq!(descriptor.request().downcast_ref::<i32>(), Some(&4));
    ///         DirectRunner.run(descriptor)
    ///     }
    /// }
    ///
    /// let computation = Computation::attempt(4, |n: i32| n / 2);
    /// assert_eq!(trusted::perform_with(&InspectingRunner, computation).ok(), Some(2));
    /// ```
    pub fn request(&self) -> &dyn Any {
        self.call.request.as_ref()
    }

    /// Separates the pending call from its continuations.
    pub fn split(self) -> (PendingCall, Continuations) {
        (self.call, self.continuations)
    }
}

impl fmt::Debug for EffectDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EffectDescriptor")
            .field("request_type", &self.call.request_type)
            .field("response_type", &self.call.response_type)
            .finish_non_exhaustive()
    }
}

/// The operation of a descriptor applied to its request, not yet called.
pub struct PendingCall {
    request: Erased,
    operation: Box<dyn FnOnce(Erased) -> Erased>,
    request_type: &'static str,
    response_type: &'static str,
}

impl PendingCall {
    pub(crate) fn new<Req, Resp, F>(request: Req, operation: F) -> Self
    where
        Req: 'static,
        Resp: 'static,
        F: FnOnce(Req) -> Resp + 'static,
    {
        Self {
            request: Box::new(request),
            operation: Box::new(move |request: Erased| {
                let request = super::interpreter::unerase::<Req>(request, "effect request");
                Box::new(operation(request)) as Erased
            }),
            request_type: std::any::type_name::<Req>(),
            response_type: std::any::type_name::<Resp>(),
        }
    }

    /// Returns the type name of the request.
    pub const fn request_type(&self) -> &'static str {
        self.request_type
    }

    /// Returns the type name of the response.
    pub const fn response_type(&self) -> &'static str {
        self.response_type
    }

    /// Calls the operation with its request.
    ///
    /// The call is not guarded: a panicking operation unwinds through this
    /// method. Runners are responsible for trapping the unwind.
    pub fn invoke(self) -> Response {
        Response((self.operation)(self.request))
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PendingCall")
            .field("request_type", &self.request_type)
            .field("response_type", &self.response_type)
            .finish_non_exhaustive()
    }
}

/// The success and failure continuations of a descriptor.
///
/// Both methods consume `self`, so exactly one of them can be invoked.
pub struct Continuations {
    on_failure: Box<dyn FnOnce(Panic) -> Step>,
    on_success: Box<dyn FnOnce(Erased) -> Step>,
}

impl Continuations {
    pub(crate) fn new<Fail, Succeed>(on_failure: Fail, on_success: Succeed) -> Self
    where
        Fail: FnOnce(Panic) -> Step + 'static,
        Succeed: FnOnce(Erased) -> Step + 'static,
    {
        Self {
            on_failure: Box::new(on_failure),
            on_success: Box::new(on_success),
        }
    }

    /// Resumes the computation with the operation's response.
    pub fn succeed(self, response: Response) -> Resumption {
        Resumption((self.on_success)(response.0))
    }

    /// Resumes the computation with a panic captured from the operation.
    ///
    /// For effects built on the trusted path this re-raises the panic
    /// instead of returning.
    pub fn fail(self, panic: Panic) -> Resumption {
        Resumption((self.on_failure)(panic))
    }
}

impl fmt::Debug for Continuations {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Continuations").finish_non_exhaustive()
    }
}

/// The value an operation returned, type-erased.
pub struct Response(Erased);

impl Response {
    /// Borrows the response as `T` if that is its type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Response").finish_non_exhaustive()
    }
}

/// The state a runner hands back to the interpreter after running an effect.
///
/// Only [`Continuations`] can produce one.
pub struct Resumption(pub(crate) Step);

impl Resumption {
    /// Returns the captured panic if the effect failed on the untrusted path.
    pub fn captured_panic(&self) -> Option<&Panic> {
        match &self.0 {
            Step::Fail(error) => error.downcast_ref::<Panic>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Resumption {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("Resumption").finish_non_exhaustive()
    }
}
