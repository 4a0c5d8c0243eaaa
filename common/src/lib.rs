// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH Common: message codec, key management and HPKE crypto shared by the
// oblivious proxy and target (RFC 9230).
//
// Cipher suite (the one odohd has always published):
//   KEM:  DHKEM(X25519, HKDF-SHA256)  0x0020
//   KDF:  HKDF-SHA256                 0x0001
//   AEAD: AES-128-GCM                 0x0001

pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod keys;
pub mod message;
mod wire;

pub use config::{ObliviousDoHConfig, ObliviousDoHConfigContents, ObliviousDoHConfigs};
pub use crypto::{encrypt_query, QueryContext, ResponseContext};
pub use error::{CodecError, CryptoError, OdohError};
pub use events::{Event, EventSink, MemorySink, NoopSink, Rcode, TracingSink};
pub use keys::{
    EphemeralKeyStore, KeyError, KeyManager, KeyPair, KeyStore, SeedFileKeyStore, SEED_LEN,
};
pub use message::{Message, MessageType, QueryBody, DNS_CONTENT_TYPE, ODOH_CONTENT_TYPE};
