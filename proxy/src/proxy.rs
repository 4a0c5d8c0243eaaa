// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Opaque relay to a target. Payloads are forwarded and returned byte-for-byte
// and never inspected, logged or cached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use odoh_common::{Event, EventSink, ODOH_CONTENT_TYPE};

pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_millis(2500);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("target did not answer within {0:?}")]
    Timeout(Duration),

    #[error("could not connect to target: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("request to target failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }

    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else if err.is_connect() {
            TransportError::Connect(err)
        } else {
            TransportError::Request(err)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Upper bound on one relayed exchange, body included.
    pub timeout: Duration,
    /// Scheme used to reach targets. `https` outside of tests.
    pub target_scheme: String,
    /// Idle pooled connections kept per target host.
    pub max_idle_per_host: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROXY_TIMEOUT,
            target_scheme: "https".to_string(),
            max_idle_per_host: 1024,
        }
    }
}

/// What the target said, untouched.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub struct Proxy {
    client: reqwest::Client,
    events: Arc<dyn EventSink>,
    config: ProxyConfig,
}

impl Proxy {
    pub fn new(config: ProxyConfig, events: Arc<dyn EventSink>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            events,
            config,
        })
    }

    /// `<scheme>://<targethost><targetpath>` from the RFC 9230 query
    /// parameters. The host must be a bare authority and the path absolute.
    pub fn target_uri(&self, host: &str, path: &str) -> Result<String, TransportError> {
        let host_ok = !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']'));
        if !host_ok {
            return Err(TransportError::InvalidTarget(format!("bad targethost {host:?}")));
        }

        let path_ok = path.starts_with('/')
            && !path
                .chars()
                .any(|c| c.is_ascii_whitespace() || c.is_ascii_control() || c == '#');
        if !path_ok {
            return Err(TransportError::InvalidTarget(format!("bad targetpath {path:?}")));
        }

        Ok(format!("{}://{host}{path}", self.config.target_scheme))
    }

    /// POST `payload` to `target` and hand back whatever it answers.
    ///
    /// Any HTTP status from the target counts as a successful relay; only
    /// failures to complete the exchange are errors.
    pub async fn relay(&self, target: &str, payload: Bytes) -> Result<Relayed, TransportError> {
        let started = Instant::now();
        let timeout = self.config.timeout;

        let result = match tokio::time::timeout(timeout, self.exchange(target, payload)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        };

        match &result {
            Ok(relayed) => self.events.emit(Event::Relayed {
                status: relayed.status,
                elapsed: started.elapsed(),
            }),
            Err(e) => {
                debug!(error = %e, "relay failed");
                self.events.emit(Event::RelayFailed {
                    timed_out: e.is_timeout(),
                });
            }
        }
        result
    }

    async fn exchange(&self, target: &str, payload: Bytes) -> Result<Relayed, TransportError> {
        let timeout = self.config.timeout;

        let response = self
            .client
            .post(target)
            .header(CONTENT_TYPE, ODOH_CONTENT_TYPE)
            .header(ACCEPT, ODOH_CONTENT_TYPE)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    TransportError::InvalidTarget(target.to_string())
                } else {
                    TransportError::from_reqwest(e, timeout)
                }
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        Ok(Relayed {
            status,
            content_type,
            body,
        })
    }
}
