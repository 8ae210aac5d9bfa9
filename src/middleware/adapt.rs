//! Adapter for middleware written without a context.
//!
//! Plenty of middleware is written against the simpler
//! `(w, r, next)` convention, where `next` is a plain transport callback:
//!
//! ```text
//! fn(w: &mut ResponseWriter, r: &Request, next: &Next)
//! ```
//!
//! [`adapt`] turns such middleware into a [`Constructor`]. The catch: the
//! `next` callback has no context parameter, so the handlers after the
//! adapted middleware run with [`Context::background()`]. Values set by
//! constructors *before* it are not visible past it, and the request's
//! cancellation does not reach them either.

use std::sync::Arc;

use crate::chain::Constructor;
use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// The `next` callback handed to [`Middleware::serve_http`].
pub type Next<'a> = dyn Fn(&mut ResponseWriter, &Request) + 'a;

/// Middleware in the `(w, r, next)` convention.
pub trait Middleware: Send + Sync + 'static {
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request, next: &Next<'_>);
}

/// Lets an ordinary function or closure act as [`Middleware`].
#[derive(Clone, Copy)]
pub struct MiddlewareFunc<F>(F);

impl<F> MiddlewareFunc<F>
where
    F: Fn(&mut ResponseWriter, &Request, &Next<'_>) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Middleware for MiddlewareFunc<F>
where
    F: Fn(&mut ResponseWriter, &Request, &Next<'_>) + Send + Sync + 'static,
{
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request, next: &Next<'_>) {
        (self.0)(w, r, next);
    }
}

/// Converts `middleware` into a [`Constructor`].
///
/// The middleware instance is shared by every handler the constructor
/// builds; it must do its own synchronisation if it keeps state.
///
/// ```rust
/// use madhatter::middleware::{adapt, MiddlewareFunc, Next};
/// use madhatter::{Chain, Request, ResponseWriter};
///
/// let banner = MiddlewareFunc::new(|w: &mut ResponseWriter, r: &Request, next: &Next<'_>| {
///     w.write(b"welcome\n");
///     next(w, r);
/// });
///
/// let chain = Chain::new([adapt(banner)]);
/// ```
pub fn adapt<M: Middleware>(middleware: M) -> Constructor {
    let middleware = Arc::new(middleware);
    Constructor::new(move |inner: BoxedHandler| -> BoxedHandler {
        Arc::new(Adapted { middleware: Arc::clone(&middleware), inner })
    })
}

struct Adapted<M> {
    middleware: Arc<M>,
    inner: BoxedHandler,
}

impl<M: Middleware> Handler for Adapted<M> {
    fn serve_http(&self, _ctx: &Context, w: &mut ResponseWriter, r: &Request) {
        let next = |w: &mut ResponseWriter, r: &Request| {
            self.inner.serve_http(&Context::background(), w, r);
        };
        Middleware::serve_http(&*self.middleware, w, r, &next);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::handler::HandlerFunc;

    fn endpoint(seen: Arc<AtomicBool>) -> BoxedHandler {
        HandlerFunc::new(move |ctx: &Context, w: &mut ResponseWriter, _: &Request| {
            seen.store(true, Ordering::SeqCst);
            let tag = ctx.value::<String>("tag").cloned().unwrap_or_default();
            w.write(format!("{tag}app\n").as_bytes());
        })
        .into_boxed_handler()
    }

    #[test]
    fn next_reaches_inner_without_context_values() {
        let seen = Arc::new(AtomicBool::new(false));
        let c = adapt(MiddlewareFunc::new(|w: &mut ResponseWriter, r: &Request, next: &Next<'_>| {
            w.write(b"pre\n");
            next(w, r);
        }));
        let handler = c.wrap(endpoint(Arc::clone(&seen)));

        let ctx = Context::background().with_value("tag", String::from("outer\n"));
        let mut w = ResponseWriter::new();
        handler.serve_http(&ctx, &mut w, &Request::default());

        assert!(seen.load(Ordering::SeqCst));
        assert_eq!(w.body(), b"pre\napp\n");
    }

    #[test]
    fn skipping_next_stops_the_chain() {
        let seen = Arc::new(AtomicBool::new(false));
        let c = adapt(MiddlewareFunc::new(|w: &mut ResponseWriter, _: &Request, _: &Next<'_>| {
            w.write(b"blocked");
        }));
        let handler = c.wrap(endpoint(Arc::clone(&seen)));

        let mut w = ResponseWriter::new();
        handler.serve_http(&Context::background(), &mut w, &Request::default());

        assert!(!seen.load(Ordering::SeqCst));
        assert_eq!(w.body(), b"blocked");
    }
}
