// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The route table, built once from explicit target and proxy instances.

use std::sync::Arc;

use axum::{body::Body, http::Request, routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use odoh_proxy::Proxy;
use odoh_target::Target;

pub const HEALTH_PATH: &str = "/health";

/// `/proxy`, `/dns-query`, `/.well-known/odohconfigs` and `/health`.
///
/// Request spans carry the method and path only: no query string (it holds
/// plain DoH queries and target names) and no peer address.
pub fn router(target: Arc<Target>, proxy: Arc<Proxy>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .merge(odoh_target::handlers::router(target))
        .merge(odoh_proxy::handlers::router(proxy))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                info_span!("request", method = %req.method(), path = %req.uri().path())
            }),
        )
}

async fn health() -> &'static str {
    "ok"
}
