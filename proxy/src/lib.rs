// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH Proxy: forwards HPKE-sealed DNS queries from clients to a target and
// carries the sealed answers back. The proxy sees client addresses but never
// query contents; the target sees query contents but only the proxy's
// address.
//
// RFC 9230: Oblivious DNS over HTTPS, Section 5 (proxy behaviour)

pub mod handlers;
pub mod proxy;

pub use proxy::{Proxy, ProxyConfig, Relayed, TransportError, DEFAULT_PROXY_TIMEOUT};
