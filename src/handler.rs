//! Handler traits and type erasure.
//!
//! Two calling conventions meet in this crate:
//!
//! ```text
//! HttpHandler::serve_http(w, r)        ← what the transport calls
//!        ↓ RootHandler creates a cancellable Context per request
//! Handler::serve_http(ctx, w, r)       ← what middleware and endpoints implement
//! ```
//!
//! Both are object-safe so that chains of different concrete handler types can
//! be stored uniformly as `Arc<dyn …>`. The only runtime cost per hop is one
//! virtual call.

use std::sync::Arc;

use crate::context::Context;
use crate::request::Request;
use crate::response::ResponseWriter;

// ── Context-aware handlers ────────────────────────────────────────────────────

/// Handles one request, given the request's [`Context`].
///
/// There is no error channel: failures are expressed by what the handler
/// writes to the [`ResponseWriter`] (e.g. an error status), or by panicking,
/// which unwinds through every enclosing handler unless one of them
/// recovers it.
pub trait Handler: Send + Sync + 'static {
    fn serve_http(&self, ctx: &Context, w: &mut ResponseWriter, r: &Request);

    /// Erases the concrete type so the handler can sit in a chain.
    fn into_boxed_handler(self) -> BoxedHandler
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

/// A type-erased, shareable context-aware handler.
pub type BoxedHandler = Arc<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve_http(&self, ctx: &Context, w: &mut ResponseWriter, r: &Request) {
        (**self).serve_http(ctx, w, r);
    }
}

/// Lets an ordinary function or closure act as a [`Handler`].
///
/// ```rust
/// use madhatter::{Context, Handler, HandlerFunc, Request, ResponseWriter};
///
/// let hello = HandlerFunc::new(|_: &Context, w: &mut ResponseWriter, _: &Request| {
///     w.text("hello");
/// });
///
/// let mut w = ResponseWriter::new();
/// hello.serve_http(&Context::background(), &mut w, &Request::default());
/// assert_eq!(w.body(), b"hello");
/// ```
#[derive(Clone, Copy)]
pub struct HandlerFunc<F>(F);

impl<F> HandlerFunc<F>
where
    F: Fn(&Context, &mut ResponseWriter, &Request) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Handler for HandlerFunc<F>
where
    F: Fn(&Context, &mut ResponseWriter, &Request) + Send + Sync + 'static,
{
    fn serve_http(&self, ctx: &Context, w: &mut ResponseWriter, r: &Request) {
        (self.0)(ctx, w, r);
    }
}

/// Plain function-pointer form of a handler. Mostly useful to name the type
/// of an absent handler: `chain.then_func(None::<HandlerFn>)`.
pub type HandlerFn = fn(&Context, &mut ResponseWriter, &Request);

// ── Transport handlers ────────────────────────────────────────────────────────

/// The transport's calling convention: no context, just the response sink and
/// the request. [`Chain::then`](crate::Chain::then) produces one of these;
/// [`Server::serve`](crate::Server::serve) consumes one.
pub trait HttpHandler: Send + Sync + 'static {
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request);
}

/// A type-erased, shareable transport handler.
pub type BoxedHttpHandler = Arc<dyn HttpHandler>;

impl<H: HttpHandler + ?Sized> HttpHandler for Arc<H> {
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request) {
        (**self).serve_http(w, r);
    }
}

impl<H: HttpHandler + ?Sized> HttpHandler for &'static H {
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request) {
        (**self).serve_http(w, r);
    }
}

/// Lets an ordinary function or closure act as an [`HttpHandler`].
#[derive(Clone, Copy)]
pub struct HttpHandlerFunc<F>(F);

impl<F> HttpHandlerFunc<F>
where
    F: Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> HttpHandler for HttpHandlerFunc<F>
where
    F: Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static,
{
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request) {
        (self.0)(w, r);
    }
}

/// Lifts a transport handler into a context-aware one by dropping the
/// context on every call.
pub(crate) fn adapt_final<H: HttpHandler>(h: H) -> BoxedHandler {
    Arc::new(FinalAdapter(h))
}

struct FinalAdapter<H>(H);

impl<H: HttpHandler> Handler for FinalAdapter<H> {
    fn serve_http(&self, _ctx: &Context, w: &mut ResponseWriter, r: &Request) {
        self.0.serve_http(w, r);
    }
}
