// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Big-endian cursor helpers for the TLS-presentation-language structures
// used by RFC 9230 (u8/u16 integers, u16 length-prefixed vectors).

use crate::error::CodecError;

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn bytes(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::Truncated {
                field,
                need: len,
                got: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.bytes(1, field)?[0])
    }

    pub(crate) fn u16(&mut self, field: &'static str) -> Result<u16, CodecError> {
        let b = self.bytes(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read an `opaque field<0..2^16-1>`.
    pub(crate) fn vec16(&mut self, field: &'static str) -> Result<&'a [u8], CodecError> {
        let len = self.u16(field)? as usize;
        self.bytes(len, field)
    }

    /// Fail unless the whole buffer has been consumed.
    pub(crate) fn finish(self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

/// Append an `opaque field<0..2^16-1>`.
pub(crate) fn put_vec16(out: &mut Vec<u8>, data: &[u8], field: &'static str) -> Result<(), CodecError> {
    let len = u16::try_from(data.len()).map_err(|_| CodecError::TooLong(field))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(data);
    Ok(())
}
