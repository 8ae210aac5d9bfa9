//! Minimal madhatter example: middleware chains around the default mux.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -H 'authorization: Bearer t' http://localhost:3000/users/42
//!   curl -X POST -H 'authorization: Bearer t' http://localhost:3000/users/42

use std::sync::Arc;

use http::{Method, StatusCode};
use madhatter::{
    default_serve_mux, middleware, BoxedHandler, Chain, Constructor, Context, HandlerFunc,
    Request, ResponseWriter, Server,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let authed = Chain::new([Constructor::new(require_auth)]);

    default_serve_mux()
        .handle_func(Method::GET, "/healthz", |w: &mut ResponseWriter, _: &Request| w.text("ok"))
        .handle(Method::GET, "/users/{id}", authed.then_func(Some(get_user)));

    // No endpoint: every request falls through to the default mux.
    let app = Chain::new([middleware::trace(), middleware::recover()]).then(None::<BoxedHandler>);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// Rejects requests without an authorization header; otherwise records the
// token in the context for handlers further in.
fn require_auth(next: BoxedHandler) -> BoxedHandler {
    Arc::new(HandlerFunc::new(move |ctx: &Context, w: &mut ResponseWriter, r: &Request| {
        let Some(token) = r.header("authorization") else {
            w.error("401 unauthorized", StatusCode::UNAUTHORIZED);
            return;
        };
        next.serve_http(&ctx.with_value("token", token.to_owned()), w, r);
    }))
}

fn get_user(ctx: &Context, w: &mut ResponseWriter, r: &Request) {
    let id = r.path().rsplit('/').next().unwrap_or("unknown");
    let authed = ctx.value::<String>("token").is_some();
    w.json(format!(r#"{{"id":"{id}","authed":{authed}}}"#).as_bytes());
}
