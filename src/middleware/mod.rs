//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, panic recovery, request-id
//! injection, and authentication-header inspection. Each item here is a
//! [`Constructor`](crate::Constructor), ready to go into a
//! [`Chain`](crate::Chain).
//!
//! Built-in middleware:
//! - [`trace`]: per-request span with method, path, status, latency
//! - [`recover`]: turns a panic further down the chain into a `500`
//! - [`adapt`]: runs `(w, r, next)`-style middleware inside a chain

mod adapt;
mod recover;
mod trace;

pub use adapt::{adapt, Middleware, MiddlewareFunc, Next};
pub use recover::recover;
pub use trace::trace;
