//! Handler trait and type erasure.
//!
//! # The callables in a chain
//!
//! Route files and middleware files produce the same kind of value: a
//! [`BoxedHandler`]. The composer never looks inside one; it only orders
//! them. At dispatch time a chain runs front to back, each step receiving a
//! [`Next`] that continues with the rest.
//!
//! Two function shapes are accepted:
//!
//! ```text
//! async fn handler(req: Request) -> impl IntoResponse               ← terminal
//! async fn middleware(req: Request, next: Next) -> impl IntoResponse ← may call next.run(req)
//! ```
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn auth(req, next) { … }            ← user writes this
//!        ↓ BoxedHandler::new(auth)
//! auth.into_boxed_handler()                 ← Handler<(Request, Next)> blanket impl
//!        ↓
//! Arc::new(MiddlewareFn(auth))              ← heap-allocated wrapper
//!        ↓  stored as Arc<dyn ErasedHandler>
//! handler.call(req, next)  at request time  ← one vtable dispatch
//! ```
//!
//! Closures passed to [`BoxedHandler::new`] need their argument types
//! spelled out (`|req: Request, next: Next| …`): with two accepted shapes
//! the compiler cannot pick one from an untyped closure.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid handler or middleware function.
///
/// You never implement this yourself. `M` only tells the two blanket impls
/// apart; it is `(Request,)` for terminal handlers and `(Request, Next)` for
/// middleware.
pub trait Handler<M>: private::Sealed<M> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed<M> {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        BoxedHandler::from_erased(Arc::new(FnHandler(self)))
    }
}

impl<F, Fut, R> private::Sealed<(Request, Next)> for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler<(Request, Next)> for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        BoxedHandler::from_erased(Arc::new(MiddlewareFn(self)))
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, _next: Next) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

struct MiddlewareFn<F>(F);

impl<F, Fut, R> ErasedHandler for MiddlewareFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── BoxedHandler ──────────────────────────────────────────────────────────────

/// A type-erased, shareable handler or middleware.
///
/// Cloning is one atomic increment. The optional name is for diagnostics
/// only; it never affects ordering or matching.
#[derive(Clone)]
pub struct BoxedHandler {
    inner: Arc<dyn ErasedHandler + Send + Sync + 'static>,
    name: Option<Arc<str>>,
}

impl BoxedHandler {
    pub fn new<M>(handler: impl Handler<M>) -> Self {
        handler.into_boxed_handler()
    }

    /// A handler carrying its own name.
    pub fn named<M>(name: &str, handler: impl Handler<M>) -> Self {
        handler.into_boxed_handler().with_name(name)
    }

    fn from_erased(inner: Arc<dyn ErasedHandler + Send + Sync + 'static>) -> Self {
        Self { inner, name: None }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether both values share the same underlying function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn call(&self, req: Request, next: Next) -> BoxFuture {
        self.inner.call(req, next)
    }
}

impl fmt::Debug for BoxedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("<anonymous>"))
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// One step of a dispatch: a handler and the path parameters its
/// registration captured.
#[derive(Clone)]
pub(crate) struct Step {
    pub(crate) handler: BoxedHandler,
    pub(crate) params: Arc<HashMap<String, String>>,
}

/// The remainder of a chain.
///
/// Running past the last step yields `404 Not Found`, the same answer as a
/// path nothing matched.
#[derive(Clone)]
pub struct Next {
    steps: Arc<[Step]>,
    index: usize,
}

impl Next {
    pub(crate) fn new(steps: Arc<[Step]>) -> Self {
        Self { steps, index: 0 }
    }

    /// A continuation with nothing left in it.
    pub fn end() -> Self {
        Self::new(Arc::from(Vec::new()))
    }

    /// Runs the next step with `req`.
    pub fn run(self, mut req: Request) -> BoxFuture {
        let Some(step) = self.steps.get(self.index) else {
            return Box::pin(async { Response::status(StatusCode::NOT_FOUND) });
        };
        req.params = (*step.params).clone();
        let handler = step.handler.clone();
        let rest = Next { steps: Arc::clone(&self.steps), index: self.index + 1 };
        handler.call(req, rest)
    }

    /// Steps left, including the one `run` would call.
    pub fn remaining(&self) -> usize {
        self.steps.len().saturating_sub(self.index)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("remaining", &self.remaining()).finish()
    }
}
