// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH message envelope and plaintext body (RFC 9230 Section 6).
//
// Wire format:
//   ObliviousDoHMessage {
//     uint8  message_type;
//     opaque key_id<0..2^16-1>;
//     opaque encrypted_message<1..2^16-1>;
//   }
//
//   ObliviousDoHMessagePlaintext {
//     opaque dns_message<1..2^16-1>;
//     opaque padding<0..2^16-1>;
//   }

use crate::error::CodecError;
use crate::wire::{put_vec16, Reader};

/// HTTP media type for ODoH messages.
pub const ODOH_CONTENT_TYPE: &str = "application/oblivious-dns-message";

/// HTTP media type for plain DNS wire messages (RFC 8484).
pub const DNS_CONTENT_TYPE: &str = "application/dns-message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Query = 0x01,
    Response = 0x02,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Query => "query",
            MessageType::Response => "response",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MessageType::Query),
            0x02 => Ok(MessageType::Response),
            other => Err(CodecError::UnknownMessageType(other)),
        }
    }
}

/// An encrypted ODoH envelope.
///
/// For queries `key_id` names the target config the payload was sealed to;
/// for responses it carries the response nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_type: MessageType,
    pub key_id: Vec<u8>,
    pub encrypted_payload: Vec<u8>,
}

impl Message {
    pub fn query(key_id: Vec<u8>, encrypted_payload: Vec<u8>) -> Self {
        Self {
            message_type: MessageType::Query,
            key_id,
            encrypted_payload,
        }
    }

    pub fn response(nonce: Vec<u8>, encrypted_payload: Vec<u8>) -> Self {
        Self {
            message_type: MessageType::Response,
            key_id: nonce,
            encrypted_payload,
        }
    }

    /// Parse an envelope. Pure: nothing is retained on failure.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let message_type = MessageType::try_from(r.u8("message_type")?)?;
        let key_id = r.vec16("key_id")?.to_vec();
        let encrypted_payload = r.vec16("encrypted_message")?.to_vec();
        r.finish()?;

        if encrypted_payload.is_empty() {
            return Err(CodecError::Empty("encrypted_message"));
        }

        Ok(Self {
            message_type,
            key_id,
            encrypted_payload,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(5 + self.key_id.len() + self.encrypted_payload.len());
        out.push(self.message_type as u8);
        put_vec16(&mut out, &self.key_id, "key_id")?;
        put_vec16(&mut out, &self.encrypted_payload, "encrypted_message")?;
        Ok(out)
    }

    /// Additional authenticated data bound into the AEAD:
    /// `message_type || len(key_id) || key_id`.
    pub(crate) fn aad(message_type: MessageType, key_id: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut aad = Vec::with_capacity(3 + key_id.len());
        aad.push(message_type as u8);
        put_vec16(&mut aad, key_id, "key_id")?;
        Ok(aad)
    }
}

/// Plaintext carried inside an encrypted query or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBody {
    pub dns_message: Vec<u8>,
    pub padding: Vec<u8>,
}

impl QueryBody {
    pub fn new(dns_message: Vec<u8>) -> Self {
        Self {
            dns_message,
            padding: Vec::new(),
        }
    }

    /// Zero-pad so that `dns_message.len() + padding.len()` is a multiple of
    /// `block`. A block of 0 or 1 adds no padding.
    pub fn with_padding(dns_message: Vec<u8>, block: usize) -> Self {
        let pad = Self::padding_len(dns_message.len(), block);
        Self {
            dns_message,
            padding: vec![0u8; pad],
        }
    }

    /// Zero bytes [`QueryBody::with_padding`] adds to a `len`-byte message.
    pub fn padding_len(len: usize, block: usize) -> usize {
        match block {
            0 | 1 => 0,
            b => (b - len % b) % b,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let dns_message = r.vec16("dns_message")?.to_vec();
        let padding = r.vec16("padding")?.to_vec();
        r.finish()?;

        if dns_message.is_empty() {
            return Err(CodecError::Empty("dns_message"));
        }
        if padding.iter().any(|&b| b != 0) {
            return Err(CodecError::NonZeroPadding);
        }

        Ok(Self {
            dns_message,
            padding,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(4 + self.dns_message.len() + self.padding.len());
        put_vec16(&mut out, &self.dns_message, "dns_message")?;
        put_vec16(&mut out, &self.padding, "padding")?;
        Ok(out)
    }
}
