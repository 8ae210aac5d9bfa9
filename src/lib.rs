//! # madhatter
//!
//! Context-aware middleware chaining for HTTP handlers.
//!
//! ## The contract
//!
//! Every handler receives three things: a [`Context`], a [`ResponseWriter`]
//! and the [`Request`]. A [`Chain`] is an ordered list of middleware
//! [`Constructor`]s; [`Chain::then`] wraps an endpoint in all of them and
//! puts the result behind a root boundary that gives each request a fresh,
//! cancellable context and cancels it when the request is over, panics
//! included.
//!
//! What the chain does:
//!
//! - **Ordering**: the first constructor is the outermost wrapper
//! - **Immutability**: [`Chain::append`] returns a new chain; chains are
//!   shareable across threads
//! - **Context lifecycle**: one context per request, cancelled exactly once
//!
//! What it leaves to its collaborators: routing ([`ServeMux`]) and the
//! socket ([`Server`]).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use madhatter::{
//!     middleware, BoxedHandler, Chain, Constructor, Context, HandlerFunc, Request,
//!     ResponseWriter, Server,
//! };
//!
//! fn with_user(next: BoxedHandler) -> BoxedHandler {
//!     Arc::new(HandlerFunc::new(move |ctx: &Context, w: &mut ResponseWriter, r: &Request| {
//!         let user = r.header("x-user").unwrap_or("anonymous").to_owned();
//!         next.serve_http(&ctx.with_value("user", user), w, r);
//!     }))
//! }
//!
//! fn hello(ctx: &Context, w: &mut ResponseWriter, _: &Request) {
//!     let user = ctx.value::<String>("user").map_or("stranger", String::as_str);
//!     w.text(format!("hello, {user}"));
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let chain = Chain::new([middleware::trace(), Constructor::new(with_user)]);
//!     let app = chain.then_func(Some(hello));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//! ```

mod chain;
mod context;
mod error;
mod handler;
mod mux;
mod request;
mod response;
mod server;

pub mod middleware;

pub use chain::{Chain, Constructor};
pub use context::{CancelFunc, Context};
pub use error::Error;
pub use handler::{
    BoxedHandler, BoxedHttpHandler, Handler, HandlerFn, HandlerFunc, HttpHandler, HttpHandlerFunc,
};
pub use mux::{default_serve_mux, ServeMux};
pub use request::Request;
pub use response::{ContentType, ResponseWriter};
pub use server::Server;
