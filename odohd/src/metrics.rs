// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Prometheus metrics fed from target and proxy events, served on their own
// listener.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder, TEXT_FORMAT,
};
use tracing::warn;

use odoh_common::{Event, EventSink, Rcode, TracingSink};

pub const METRICS_PATH: &str = "/metrics";

/// Counts every event, times upstream and relay exchanges, and passes the
/// event on to the tracing log.
pub struct PrometheusSink {
    registry: Registry,
    events: IntCounterVec,
    error_answers: IntCounterVec,
    resolve_seconds: Histogram,
    relay_seconds: Histogram,
    relay_status: IntCounterVec,
    log: TracingSink,
}

impl PrometheusSink {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events = IntCounterVec::new(
            Opts::new("odoh_events_total", "Target and proxy events by kind"),
            &["event"],
        )?;
        let error_answers = IntCounterVec::new(
            Opts::new(
                "odoh_error_answers_total",
                "Encrypted responses carrying a synthesised DNS error",
            ),
            &["rcode"],
        )?;
        let resolve_seconds = Histogram::with_opts(HistogramOpts::new(
            "odoh_resolve_duration_seconds",
            "Upstream DNS exchange latency",
        ))?;
        let relay_seconds = Histogram::with_opts(HistogramOpts::new(
            "odoh_relay_duration_seconds",
            "Proxy to target exchange latency",
        ))?;
        let relay_status = IntCounterVec::new(
            Opts::new("odoh_relay_status_total", "Target HTTP statuses seen by the proxy"),
            &["status"],
        )?;

        registry.register(Box::new(events.clone()))?;
        registry.register(Box::new(error_answers.clone()))?;
        registry.register(Box::new(resolve_seconds.clone()))?;
        registry.register(Box::new(relay_seconds.clone()))?;
        registry.register(Box::new(relay_status.clone()))?;

        Ok(Self {
            registry,
            events,
            error_answers,
            resolve_seconds,
            relay_seconds,
            relay_status,
            log: TracingSink,
        })
    }

    /// Text exposition of everything registered.
    pub fn render(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

impl EventSink for PrometheusSink {
    fn emit(&self, event: Event) {
        self.events.with_label_values(&[event.name()]).inc();

        match &event {
            Event::Resolved { elapsed } => self.resolve_seconds.observe(elapsed.as_secs_f64()),
            Event::Relayed { status, elapsed } => {
                self.relay_seconds.observe(elapsed.as_secs_f64());
                self.relay_status
                    .with_label_values(&[&status.to_string()])
                    .inc();
            }
            Event::ResponseSealed { rcode: Some(rcode) } => {
                let label = match rcode {
                    Rcode::FormErr => "formerr",
                    Rcode::ServFail => "servfail",
                };
                self.error_answers.with_label_values(&[label]).inc();
            }
            _ => {}
        }

        self.log.emit(event);
    }
}

pub fn router(sink: Arc<PrometheusSink>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .with_state(sink)
}

async fn metrics_handler(State(sink): State<Arc<PrometheusSink>>) -> Response {
    match sink.render() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
