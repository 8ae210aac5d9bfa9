//! Panic recovery.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use http::StatusCode;
use tracing::error;

use crate::chain::Constructor;
use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Stops a panic in any handler inside it from unwinding further.
///
/// The panic is logged at `error`. If the failing handler had not written a
/// status yet, the response becomes `500 Internal Server Error`; otherwise
/// whatever was written stands. Handlers outside `recover` carry on as if the
/// inner handler had returned normally.
pub fn recover() -> Constructor {
    Constructor::new(|inner: BoxedHandler| -> BoxedHandler { Arc::new(Recover { inner }) })
}

struct Recover {
    inner: BoxedHandler,
}

impl Handler for Recover {
    fn serve_http(&self, ctx: &Context, w: &mut ResponseWriter, r: &Request) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.inner.serve_http(ctx, w, r)));

        if let Err(payload) = outcome {
            error!(
                method = %r.method(),
                path = %r.path(),
                panic = panic_message(payload.as_ref()),
                "handler panicked"
            );
            if !w.is_written() {
                w.error("Internal Server Error", StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
