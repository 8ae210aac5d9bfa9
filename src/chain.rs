//! Middleware chaining.
//!
//! A [`Chain`] is an ordered list of [`Constructor`]s. Nothing is built until
//! [`Chain::then`] is called; at that point the constructors wrap the
//! endpoint from the inside out and the result is wrapped once more in the
//! root boundary, which owns the per-request [`Context`].
//!
//! ```text
//! Chain::new([m1, m2, m3]).then(h)
//!        ≡
//! root( m1( m2( m3(h) ) ) )
//!   │
//!   └─ per request: ctx = background().with_cancel(); serve; cancel
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::handler::{
    adapt_final, BoxedHandler, BoxedHttpHandler, Handler, HandlerFunc, HttpHandler,
};
use crate::mux::default_serve_mux;
use crate::request::Request;
use crate::response::ResponseWriter;

// ── Constructor ───────────────────────────────────────────────────────────────

/// A middleware factory: takes the handler to wrap, returns the wrapper.
///
/// The wrapper may run code before and after delegating to `inner`, or never
/// call `inner` at all (an auth gate rejecting the request, say).
///
/// ```rust
/// use std::sync::Arc;
/// use madhatter::{BoxedHandler, Constructor, Context, HandlerFunc, Request, ResponseWriter};
///
/// fn powered_by(next: BoxedHandler) -> BoxedHandler {
///     Arc::new(HandlerFunc::new(move |ctx: &Context, w: &mut ResponseWriter, r: &Request| {
///         w.headers_mut().insert("x-powered-by", "madhatter".parse().unwrap());
///         next.serve_http(ctx, w, r);
///     }))
/// }
///
/// let c = Constructor::new(powered_by);
/// ```
#[derive(Clone)]
pub struct Constructor(Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync>);

impl Constructor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Builds the wrapper around `inner`.
    pub fn wrap(&self, inner: BoxedHandler) -> BoxedHandler {
        (self.0)(inner)
    }

    /// Whether both values came from the same [`Constructor::new`] call.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constructor").field(&Arc::as_ptr(&self.0)).finish()
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An immutable, reusable list of middleware constructors.
///
/// Once created, a chain holds the same constructors in the same order for
/// its whole life. [`append`](Self::append) returns a new chain instead of
/// growing this one, so a chain can be shared between threads and extended
/// per route group without any locking.
#[derive(Clone)]
pub struct Chain {
    constructors: Vec<Constructor>,
    finalize: fn(BoxedHandler) -> BoxedHttpHandler,
}

impl Chain {
    /// Memorises `constructors`. They are not called until
    /// [`then`](Self::then) or [`then_func`](Self::then_func).
    pub fn new(constructors: impl IntoIterator<Item = Constructor>) -> Self {
        Self {
            constructors: constructors.into_iter().collect(),
            finalize: root_handler,
        }
    }

    /// Wraps `handler` in every constructor and returns the transport handler.
    ///
    /// `Chain::new([m1, m2, m3]).then(h)` is equivalent to `m1(m2(m3(h)))`
    /// behind the root boundary.
    ///
    /// A chain can be reused by calling `then` several times. Constructors run
    /// again on every call, so each call gets its own middleware instances;
    /// whatever a constructor captures while wrapping belongs to that call
    /// alone.
    ///
    /// `None` stands for the [default serve mux](crate::default_serve_mux),
    /// called without a context: `chain.then(None::<BoxedHandler>)`.
    pub fn then<H: Handler>(&self, handler: Option<H>) -> BoxedHttpHandler {
        let endpoint = match handler {
            Some(h) => h.into_boxed_handler(),
            None => adapt_final(default_serve_mux()),
        };

        let composed = self
            .constructors
            .iter()
            .rev()
            .fold(endpoint, |inner, c| c.wrap(inner));

        (self.finalize)(composed)
    }

    /// Like [`then`](Self::then), for a plain function or closure.
    ///
    /// `c.then_func(Some(f))` is equivalent to
    /// `c.then(Some(HandlerFunc::new(f)))`, and `None` falls back to the
    /// default serve mux exactly as in `then`.
    pub fn then_func<F>(&self, f: Option<F>) -> BoxedHttpHandler
    where
        F: Fn(&Context, &mut ResponseWriter, &Request) + Send + Sync + 'static,
    {
        self.then(f.map(HandlerFunc::new))
    }

    /// Returns a new chain with `constructors` added after this chain's own.
    /// This chain is left untouched.
    pub fn append(&self, constructors: impl IntoIterator<Item = Constructor>) -> Self {
        let extra: Vec<Constructor> = constructors.into_iter().collect();

        let mut combined = Vec::with_capacity(self.constructors.len() + extra.len());
        combined.extend(self.constructors.iter().cloned());
        combined.extend(extra);

        Self::new(combined)
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new([])
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("constructors", &self.constructors).finish()
    }
}

// ── Root boundary ─────────────────────────────────────────────────────────────

fn root_handler(inner: BoxedHandler) -> BoxedHttpHandler {
    Arc::new(RootHandler { inner })
}

/// Bridges the transport's context-free convention to [`Handler`].
///
/// This is the only place a request context is created or cancelled.
struct RootHandler {
    inner: BoxedHandler,
}

impl HttpHandler for RootHandler {
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request) {
        let (ctx, cancel) = Context::background().with_cancel();
        // Cancels on every way out of this scope, unwinding included.
        let _cancel = cancel.drop_guard();

        self.inner.serve_http(&ctx, w, r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Constructor {
        Constructor::new(|next| next)
    }

    #[test]
    fn new_copies_constructors_in_order() {
        let list = vec![noop(), noop()];
        let chain = Chain::new(list.clone());

        assert_eq!(chain.len(), 2);
        assert!(Constructor::ptr_eq(&chain.constructors()[0], &list[0]));
        assert!(Constructor::ptr_eq(&chain.constructors()[1], &list[1]));
        assert_ne!(chain.constructors.as_ptr(), list.as_ptr());
    }

    #[test]
    fn append_allocates_fresh_storage() {
        let chain = Chain::new([noop()]);
        let longer = chain.append([noop()]);

        assert_eq!(chain.len(), 1);
        assert_eq!(longer.len(), 2);
        assert_ne!(chain.constructors.as_ptr(), longer.constructors.as_ptr());
        assert!(Constructor::ptr_eq(&chain.constructors[0], &longer.constructors[0]));
    }

    #[test]
    fn append_keeps_finalizer() {
        let chain = Chain::new([]);
        let longer = chain.append([noop()]);
        assert_eq!(chain.finalize as usize, longer.finalize as usize);
    }

    #[test]
    fn default_is_empty() {
        assert!(Chain::default().is_empty());
    }
}
