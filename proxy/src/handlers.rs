// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP surface of the proxy: `POST /proxy?targethost=..&targetpath=..`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;

use odoh_common::ODOH_CONTENT_TYPE;

use crate::proxy::{Proxy, TransportError};

pub const PROXY_PATH: &str = "/proxy";

pub fn router(proxy: Arc<Proxy>) -> Router {
    Router::new()
        .route(PROXY_PATH, post(proxy_handler))
        .with_state(proxy)
}

/// Relay one sealed query. The target's status and body go back unchanged;
/// 502/504 are reserved for failing to reach it.
pub async fn proxy_handler(
    State(proxy): State<Arc<Proxy>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim());
    if !content_type.is_some_and(|ct| ct.eq_ignore_ascii_case(ODOH_CONTENT_TYPE)) {
        return (
            StatusCode::BAD_REQUEST,
            "expected application/oblivious-dns-message",
        )
            .into_response();
    }

    let (Some(host), Some(path)) = (params.get("targethost"), params.get("targetpath")) else {
        return (
            StatusCode::BAD_REQUEST,
            "missing targethost or targetpath",
        )
            .into_response();
    };

    let target = match proxy.target_uri(host, path) {
        Ok(target) => target,
        Err(e) => return error_response(&e),
    };

    match proxy.relay(&target, body).await {
        Ok(relayed) => {
            let status =
                StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let content_type = relayed
                .content_type
                .as_deref()
                .and_then(|ct| HeaderValue::from_str(ct).ok())
                .unwrap_or_else(|| HeaderValue::from_static(ODOH_CONTENT_TYPE));
            (status, [(header::CONTENT_TYPE, content_type)], relayed.body).into_response()
        }
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &TransportError) -> Response {
    match err {
        TransportError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "target timed out").into_response(),
        TransportError::InvalidTarget(_) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        TransportError::Connect(_) | TransportError::Request(_) | TransportError::Client(_) => {
            (StatusCode::BAD_GATEWAY, "target unreachable").into_response()
        }
    }
}
