//! Radix-tree request multiplexer.
//!
//! One tree per HTTP method, O(path-length) lookup. A [`Chain`](crate::Chain)
//! given no endpoint falls back to the process-wide
//! [`default_serve_mux`], the way a server with no explicit handler would.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHttpHandler, HttpHandler, HttpHandlerFunc};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Routes requests to transport handlers by method and path.
///
/// Registration takes `&self` so the shared default mux can be filled from
/// anywhere at startup. Lookups clone the matched handler out of the table
/// before calling it; no lock is held while a handler runs.
///
/// ```rust
/// use http::Method;
/// use madhatter::{HttpHandlerFunc, Request, ResponseWriter, ServeMux};
///
/// let mux = ServeMux::new();
/// mux.handle(Method::GET, "/users/{id}", HttpHandlerFunc::new(|w: &mut ResponseWriter, _: &Request| {
///     w.json(br#"{"id":"42"}"#);
/// }));
/// ```
pub struct ServeMux {
    routes: RwLock<HashMap<Method, MatchitRouter<BoxedHttpHandler>>>,
}

impl ServeMux {
    pub fn new() -> Self {
        Self { routes: RwLock::new(HashMap::new()) }
    }

    /// Registers `handler` for a method + path pair. Returns `self` so
    /// registrations chain.
    ///
    /// Path parameters use matchit's `{name}` syntax, catch-alls `{*rest}`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or collides with one already
    /// registered for `method`.
    pub fn handle(&self, method: Method, path: &str, handler: impl HttpHandler) -> &Self {
        let handler: BoxedHttpHandler = Arc::new(handler);
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// [`handle`](Self::handle) for a plain function or closure.
    pub fn handle_func<F>(&self, method: Method, path: &str, f: F) -> &Self
    where
        F: Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static,
    {
        self.handle(method, path, HttpHandlerFunc::new(f))
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(matched) = routes.get(method).and_then(|tree| tree.at(path).ok()) {
            return Lookup::Found(Arc::clone(matched.value));
        }

        let mut allowed: Vec<&str> = routes
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| m.as_str())
            .collect();
        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        allowed.sort_unstable();
        Lookup::WrongMethod(allowed.join(", "))
    }
}

enum Lookup {
    Found(BoxedHttpHandler),
    WrongMethod(String),
    NotFound,
}

impl HttpHandler for ServeMux {
    fn serve_http(&self, w: &mut ResponseWriter, r: &Request) {
        match self.lookup(r.method(), r.path()) {
            Lookup::Found(handler) => handler.serve_http(w, r),
            Lookup::WrongMethod(allow) => {
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    w.headers_mut().insert(header::ALLOW, value);
                }
                w.error("405 method not allowed", StatusCode::METHOD_NOT_ALLOWED);
            }
            Lookup::NotFound => w.error("404 page not found", StatusCode::NOT_FOUND),
        }
    }
}

impl Default for ServeMux {
    fn default() -> Self { Self::new() }
}

/// The process-wide mux used when a chain is given no endpoint.
pub fn default_serve_mux() -> &'static ServeMux {
    static DEFAULT: OnceLock<ServeMux> = OnceLock::new();
    DEFAULT.get_or_init(ServeMux::new)
}

#[cfg(test)]
mod tests {
    use http::Uri;

    use super::*;

    fn ok(body: &'static str) -> impl Fn(&mut ResponseWriter, &Request) + Send + Sync + 'static {
        move |w: &mut ResponseWriter, _: &Request| w.text(body)
    }

    fn serve(mux: &ServeMux, method: Method, path: &'static str) -> ResponseWriter {
        let mut w = ResponseWriter::new();
        mux.serve_http(&mut w, &Request::new(method, Uri::from_static(path)));
        w
    }

    #[test]
    fn routes_by_method_and_path() {
        let mux = ServeMux::new();
        mux.handle_func(Method::GET, "/users/{id}", ok("get"))
            .handle_func(Method::DELETE, "/users/{id}", ok("delete"));

        assert_eq!(serve(&mux, Method::GET, "/users/7").body(), b"get");
        assert_eq!(serve(&mux, Method::DELETE, "/users/7").body(), b"delete");
    }

    #[test]
    fn unmatched_path_is_plain_404() {
        let w = serve(&ServeMux::new(), Method::GET, "/");

        assert_eq!(w.status(), StatusCode::NOT_FOUND);
        assert_eq!(w.body(), b"404 page not found\n");
        assert_eq!(w.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn other_method_is_405_with_allow() {
        let mux = ServeMux::new();
        mux.handle_func(Method::POST, "/users", ok("created"))
            .handle_func(Method::GET, "/users", ok("list"));

        let w = serve(&mux, Method::PUT, "/users");

        assert_eq!(w.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(w.headers()[header::ALLOW], "GET, POST");
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let mux = ServeMux::new();
        mux.handle_func(Method::GET, "/a/{x}", ok("1"))
            .handle_func(Method::GET, "/a/{y}", ok("2"));
    }
}
