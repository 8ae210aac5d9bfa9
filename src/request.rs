//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request with its body fully buffered.
///
/// Handlers only ever see `&Request`: middleware can read it but never swap
/// it out from under the handlers further down the chain.
///
/// `Request::default()` is an empty `GET /`, handy for driving a handler
/// in-process.
#[derive(Debug, Default)]
pub struct Request {
    inner: http::Request<Bytes>,
}

impl Request {
    /// A body-less request for `method` and `uri`.
    pub fn new(method: Method, uri: Uri) -> Self {
        let mut inner = http::Request::new(Bytes::new());
        *inner.method_mut() = method;
        *inner.uri_mut() = uri;
        Self { inner }
    }

    pub fn method(&self) -> &Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn body(&self) -> &[u8] { self.inner.body() }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    pub fn into_inner(self) -> http::Request<Bytes> {
        self.inner
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(inner: http::Request<Bytes>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_get_root() {
        let req = Request::default();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "/");
        assert!(req.body().is_empty());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let inner = http::Request::builder()
            .uri("/users/42?full=1")
            .header("X-Request-Id", "abc")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        let req = Request::from(inner);

        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("missing"), None);
        assert_eq!(req.path(), "/users/42");
        assert_eq!(req.body(), b"{}");
    }
}
