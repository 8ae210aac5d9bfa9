//! Request-scoped context.
//!
//! A [`Context`] carries two things down the handler chain: key/value data
//! added by middleware, and a cancellation signal that fires when the request
//! is over.
//!
//! Contexts are immutable. Deriving one ([`Context::with_value`],
//! [`Context::with_cancel`]) returns a new value that shares its parent's
//! data; the parent never sees what the child adds. Clones are cheap: one
//! `Arc` clone and, at most, one token clone.
//!
//! ```rust
//! use madhatter::Context;
//!
//! let (ctx, cancel) = Context::background().with_cancel();
//! let ctx = ctx.with_value("user", String::from("alice"));
//!
//! assert_eq!(ctx.value::<String>("user").map(String::as_str), Some("alice"));
//! assert!(!ctx.is_cancelled());
//!
//! cancel.cancel();
//! assert!(ctx.is_cancelled());
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::Error;

/// One binding in the value list. Lookups walk from the newest binding to the
/// oldest, so a child shadows a parent's value for the same key.
struct Entry {
    key: &'static str,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Entry>>,
}

/// Request-scoped carrier of values and a cancellation signal.
#[derive(Clone, Default)]
pub struct Context {
    values: Option<Arc<Entry>>,
    // Nearest cancellable ancestor. `None` means the context can never be
    // cancelled.
    token: Option<CancellationToken>,
}

impl Context {
    /// The root context: no values, never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a child that is cancelled when `CancelFunc::cancel` is called
    /// or when this context is cancelled, whichever happens first.
    pub fn with_cancel(&self) -> (Self, CancelFunc) {
        let token = match &self.token {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let ctx = Self { values: self.values.clone(), token: Some(token.clone()) };
        (ctx, CancelFunc(token))
    }

    /// Derives a child with `key` bound to `value`.
    pub fn with_value<T>(&self, key: &'static str, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        let entry = Entry { key, value: Box::new(value), parent: self.values.clone() };
        Self { values: Some(Arc::new(entry)), token: self.token.clone() }
    }

    /// Returns the nearest value bound to `key`, if it has type `T`.
    ///
    /// A binding of another type hides older bindings of the same key: the
    /// lookup stops at the first match and yields `None` on a type mismatch.
    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        let mut cur = self.values.as_deref();
        while let Some(entry) = cur {
            if entry.key == key {
                return entry.value.downcast_ref::<T>();
            }
            cur = entry.parent.as_deref();
        }
        None
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// `Some(Error::Canceled)` once the context is done, `None` before.
    pub fn err(&self) -> Option<Error> {
        self.is_cancelled().then_some(Error::Canceled)
    }

    /// Resolves once the context is cancelled. Never resolves for a context
    /// with no cancellable ancestor.
    ///
    /// The returned future owns what it needs, so it can be moved into a
    /// spawned task that outlives the handler.
    pub fn done(&self) -> impl Future<Output = ()> + Send + use<> {
        let token = self.token.clone();
        async move {
            match token {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = Vec::new();
        let mut cur = self.values.as_deref();
        while let Some(entry) = cur {
            keys.push(entry.key);
            cur = entry.parent.as_deref();
        }
        f.debug_struct("Context")
            .field("keys", &keys)
            .field("cancellable", &self.token.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ── CancelFunc ────────────────────────────────────────────────────────────────

/// Cancels the context returned alongside it by [`Context::with_cancel`],
/// together with every context derived from it.
///
/// Cancelling twice is harmless. Dropping a `CancelFunc` does *not* cancel;
/// use [`drop_guard`](Self::drop_guard) for scope-bound cancellation.
#[derive(Clone, Debug)]
pub struct CancelFunc(CancellationToken);

impl CancelFunc {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Turns this into a guard that cancels when it goes out of scope,
    /// including during a panic unwind.
    pub fn drop_guard(self) -> DropGuard {
        self.0.drop_guard()
    }
}
