// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// odohd: one process serving both halves of Oblivious DoH, the target
// (`/dns-query`, `/.well-known/odohconfigs`) and the proxy (`/proxy`), plus
// a liveness check and a separate Prometheus listener.

pub mod config;
pub mod keygen;
pub mod metrics;
pub mod routes;
pub mod tls;
