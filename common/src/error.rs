// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error taxonomy shared by the proxy and the target.

/// Malformed wire data: ODoH envelopes, plaintext bodies, config lists or
/// the DNS message embedded in a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("truncated {field}: need {need} bytes, got {got}")]
    Truncated {
        field: &'static str,
        need: usize,
        got: usize,
    },

    #[error("unknown message type {0:#04x}")]
    UnknownMessageType(u8),

    #[error("unexpected message type: expected {expected}, got {got}")]
    UnexpectedMessageType {
        expected: &'static str,
        got: &'static str,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    #[error("{0} exceeds the 65535-byte field limit")]
    TooLong(&'static str),

    #[error("padding contains non-zero bytes")]
    NonZeroPadding,

    #[error("no supported config version")]
    UnsupportedVersion,

    #[error("unsupported cipher suite: kem={kem:#06x} kdf={kdf:#06x} aead={aead:#06x}")]
    UnsupportedSuite { kem: u16, kdf: u16, aead: u16 },

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("malformed DNS message")]
    MalformedDns,
}

/// Decapsulation / decryption failures.
///
/// `AuthFailure` deliberately carries no detail: a tag mismatch, a bad
/// encapsulated key and a truncated ciphertext all look the same to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("query encrypted under a key this target does not serve")]
    StaleKey,

    #[error("decryption failed")]
    AuthFailure,

    #[error("encryption failed")]
    SealFailure,
}

/// Either kind of protocol failure, for APIs that both parse and decrypt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OdohError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
