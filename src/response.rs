//! The response sink handed to every handler.
//!
//! A [`ResponseWriter`] buffers status, headers and body in memory. The
//! transport turns it into an `http::Response` once the outermost handler
//! returns, so nothing reaches the socket half-written.

use bytes::{Bytes, BytesMut};
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseWriter::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// Collects the response for one request.
///
/// The status line is fixed by the first [`write_header`](Self::write_header)
/// or [`write`](Self::write), whichever comes first. Headers set after that
/// point are still kept, since nothing is flushed before the handler chain
/// returns.
///
/// ```rust
/// use http::StatusCode;
/// use madhatter::ResponseWriter;
///
/// let mut w = ResponseWriter::new();
/// w.write_header(StatusCode::CREATED);
/// w.write(b"made it");
///
/// assert_eq!(w.status(), StatusCode::CREATED);
/// assert_eq!(w.body(), b"made it");
/// ```
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sends the status code. Only the first call has any effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if let Some(sent) = self.status {
            warn!(sent = sent.as_u16(), ignored = status.as_u16(), "superfluous write_header call");
            return;
        }
        self.status = Some(status);
    }

    /// Appends to the body, sending `200 OK` first if no status was sent.
    pub fn write(&mut self, chunk: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(chunk);
    }

    /// `text/plain; charset=utf-8` body.
    pub fn text(&mut self, body: impl AsRef<str>) {
        self.bytes(ContentType::Text, body.as_ref().as_bytes());
    }

    /// `application/json` body. Serialise however you like and pass the bytes.
    pub fn json(&mut self, body: &[u8]) {
        self.bytes(ContentType::Json, body);
    }

    /// Body with an explicit content type.
    pub fn bytes(&mut self, content_type: ContentType, body: &[u8]) {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        self.write(body);
    }

    /// Replies with `msg` as a plain-text error body and `status`.
    ///
    /// Sets `x-content-type-options: nosniff` and appends a trailing newline,
    /// so `error("404 page not found", NOT_FOUND)` produces the body
    /// `"404 page not found\n"`.
    pub fn error(&mut self, msg: &str, status: StatusCode) {
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(ContentType::Text.as_str()),
        );
        self.headers
            .insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        self.write_header(status);
        self.write(msg.as_bytes());
        self.write(b"\n");
    }

    /// The status that will be sent. `200 OK` until something else is written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Whether a status has been sent, explicitly or by a body write.
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts the buffered response into what hyper sends.
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let status = self.status();
        let mut res = http::Response::new(Full::new(self.body.freeze()));
        *res.status_mut() = status;
        *res.headers_mut() = self.headers;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_implies_ok() {
        let mut w = ResponseWriter::new();
        assert!(!w.is_written());

        w.write(b"hello");

        assert!(w.is_written());
        assert_eq!(w.status(), StatusCode::OK);
        assert_eq!(w.body(), b"hello");
    }

    #[test]
    fn first_write_header_wins() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::ACCEPTED);
        w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        w.write(b"x");

        assert_eq!(w.status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn error_writes_plain_text() {
        let mut w = ResponseWriter::new();
        w.error("nope", StatusCode::FORBIDDEN);

        assert_eq!(w.status(), StatusCode::FORBIDDEN);
        assert_eq!(w.body(), b"nope\n");
        assert_eq!(w.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(w.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[test]
    fn into_response_carries_everything() {
        let mut w = ResponseWriter::new();
        w.headers_mut().insert("location", HeaderValue::from_static("/users/99"));
        w.write_header(StatusCode::CREATED);
        w.json(br#"{"id":"99"}"#);

        let res = w.into_response();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()["location"], "/users/99");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    }
}
