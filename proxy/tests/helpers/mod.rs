// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! A stand-in target served over plain HTTP on a loopback port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use odoh_common::{MemorySink, ODOH_CONTENT_TYPE};
use odoh_proxy::{Proxy, ProxyConfig};

/// What the stand-in target received: content type and body.
pub type Seen = Arc<Mutex<Vec<(Option<String>, Vec<u8>)>>>;

pub struct FakeTarget {
    pub addr: SocketAddr,
    pub seen: Seen,
    handle: JoinHandle<()>,
}

impl FakeTarget {
    /// Routes:
    /// - `/dns-query` answers 200 with the body reversed
    /// - `/stale` answers 401
    /// - `/slow` never answers in time
    pub async fn start() -> std::io::Result<Self> {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/dns-query", post(echo_reversed))
            .route("/stale", post(stale))
            .route("/slow", post(slow))
            .with_state(Arc::clone(&seen));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, seen, handle })
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn seen(&self) -> Vec<(Option<String>, Vec<u8>)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for FakeTarget {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn echo_reversed(State(seen): State<Seen>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().unwrap().push((content_type, body.to_vec()));

    let mut answer = body.to_vec();
    answer.reverse();
    (StatusCode::OK, [(header::CONTENT_TYPE, ODOH_CONTENT_TYPE)], answer)
}

async fn stale() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, "unknown key id")
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(30)).await;
    StatusCode::OK
}

pub fn proxy(timeout: Duration) -> (Arc<Proxy>, Arc<MemorySink>) {
    let events = Arc::new(MemorySink::new());
    let proxy = Proxy::new(
        ProxyConfig {
            timeout,
            target_scheme: "http".to_string(),
            ..Default::default()
        },
        events.clone(),
    )
    .unwrap();
    (Arc::new(proxy), events)
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub const GENEROUS: Duration = Duration::from_millis(750);
