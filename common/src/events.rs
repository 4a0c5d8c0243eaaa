// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Observability events emitted by the target and the proxy.
//
// Events never carry query names, payload bytes or peer addresses: the
// whole point of the relay is that nobody downstream of it can join
// identity and content.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

/// Which DNS error a target answered with instead of an upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    FormErr,
    ServFail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An ODoH query envelope was decoded.
    QueryReceived,
    /// The query named a key this target does not serve.
    StaleKey,
    /// Decapsulation is about to run.
    DecryptAttempted,
    /// Decapsulation or AEAD open failed.
    DecryptFailed,
    /// The envelope or the embedded DNS message was malformed.
    MalformedQuery,
    /// Upstream answered.
    Resolved { elapsed: Duration },
    /// Upstream failed or timed out.
    ResolverFailed { timed_out: bool },
    /// An encrypted response (possibly carrying an error rcode) went out.
    ResponseSealed { rcode: Option<Rcode> },
    /// A plain DoH query was answered.
    PlainQuery { elapsed: Duration },
    /// The proxy relayed a payload and got an HTTP status back.
    Relayed { status: u16, elapsed: Duration },
    /// The proxy could not reach the target.
    RelayFailed { timed_out: bool },
}

impl Event {
    /// Short stable label, used as a metric label value.
    pub fn name(&self) -> &'static str {
        match self {
            Event::QueryReceived => "query_received",
            Event::StaleKey => "stale_key",
            Event::DecryptAttempted => "decrypt_attempted",
            Event::DecryptFailed => "decrypt_failed",
            Event::MalformedQuery => "malformed_query",
            Event::Resolved { .. } => "resolved",
            Event::ResolverFailed { .. } => "resolver_failed",
            Event::ResponseSealed { .. } => "response_sealed",
            Event::PlainQuery { .. } => "plain_query",
            Event::Relayed { .. } => "relayed",
            Event::RelayFailed { .. } => "relay_failed",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: Event) {}
}

/// Structured `tracing` output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event {
            Event::StaleKey => warn!(event = event.name(), "query for unknown key id"),
            Event::DecryptFailed => warn!(event = event.name(), "query decryption failed"),
            Event::MalformedQuery => debug!(event = event.name(), "malformed query"),
            Event::Resolved { elapsed } | Event::PlainQuery { elapsed } => debug!(
                event = event.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                "resolved"
            ),
            Event::ResolverFailed { timed_out } => {
                warn!(event = event.name(), timed_out, "upstream resolver failed")
            }
            Event::ResponseSealed { rcode } => {
                debug!(event = event.name(), rcode = ?rcode, "response sealed")
            }
            Event::Relayed { status, elapsed } => debug!(
                event = event.name(),
                status,
                elapsed_ms = elapsed.as_millis() as u64,
                "relayed"
            ),
            Event::RelayFailed { timed_out } => {
                warn!(event = event.name(), timed_out, "relay to target failed")
            }
            Event::QueryReceived | Event::DecryptAttempted => debug!(event = event.name()),
        }
    }
}

/// Keeps every event in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
