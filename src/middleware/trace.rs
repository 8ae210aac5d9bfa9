//! Per-request tracing span.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span};

use crate::chain::Constructor;
use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Opens an `info` span around everything inside it and logs the outcome.
///
/// Place it first in a chain so the latency covers all other middleware:
///
/// ```rust
/// use madhatter::{middleware, Chain};
///
/// let chain = Chain::new([middleware::trace(), middleware::recover()]);
/// ```
pub fn trace() -> Constructor {
    Constructor::new(|inner: BoxedHandler| -> BoxedHandler { Arc::new(Trace { inner }) })
}

struct Trace {
    inner: BoxedHandler,
}

impl Handler for Trace {
    fn serve_http(&self, ctx: &Context, w: &mut ResponseWriter, r: &Request) {
        let span = info_span!("request", method = %r.method(), path = %r.path());
        let _enter = span.enter();
        let started = Instant::now();

        self.inner.serve_http(ctx, w, r);

        info!(
            status = w.status().as_u16(),
            latency_us = started.elapsed().as_micros() as u64,
            "request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::handler::HandlerFunc;

    #[test]
    fn passes_response_through() {
        let endpoint = HandlerFunc::new(|_: &Context, w: &mut ResponseWriter, _: &Request| {
            w.write_header(StatusCode::ACCEPTED);
            w.write(b"queued");
        });
        let handler = trace().wrap(endpoint.into_boxed_handler());

        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        let mut w = ResponseWriter::new();
        tracing::subscriber::with_default(subscriber, || {
            handler.serve_http(&Context::background(), &mut w, &Request::default());
        });

        assert_eq!(w.status(), StatusCode::ACCEPTED);
        assert_eq!(w.body(), b"queued");
    }
}
