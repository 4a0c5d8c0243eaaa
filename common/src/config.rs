// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Published target configuration (RFC 9230 Section 6.1).
//
//   ObliviousDoHConfigContents { u16 kem_id; u16 kdf_id; u16 aead_id; opaque public_key<1..2^16-1>; }
//   ObliviousDoHConfig         { u16 version; u16 length; ObliviousDoHConfigContents contents; }
//   ObliviousDoHConfigs        { ObliviousDoHConfig configs<1..2^16-1>; }

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CodecError;
use crate::wire::{put_vec16, Reader};

/// The only config version this implementation speaks.
pub const ODOH_VERSION: u16 = 0x0001;

/// DHKEM(X25519, HKDF-SHA256)
pub const KEM_X25519_HKDF_SHA256: u16 = 0x0020;
/// HKDF-SHA256
pub const KDF_HKDF_SHA256: u16 = 0x0001;
/// AES-128-GCM
pub const AEAD_AES_128_GCM: u16 = 0x0001;

/// Length of a key id (Nh for HKDF-SHA256).
pub const KEY_ID_LEN: usize = 32;

const KEY_ID_INFO: &[u8] = b"odoh key id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObliviousDoHConfigContents {
    pub kem_id: u16,
    pub kdf_id: u16,
    pub aead_id: u16,
    pub public_key: Vec<u8>,
}

impl ObliviousDoHConfigContents {
    /// Contents for the suite this crate implements.
    pub fn x25519_sha256_aes128gcm(public_key: Vec<u8>) -> Self {
        Self {
            kem_id: KEM_X25519_HKDF_SHA256,
            kdf_id: KDF_HKDF_SHA256,
            aead_id: AEAD_AES_128_GCM,
            public_key,
        }
    }

    pub fn is_supported_suite(&self) -> bool {
        self.kem_id == KEM_X25519_HKDF_SHA256
            && self.kdf_id == KDF_HKDF_SHA256
            && self.aead_id == AEAD_AES_128_GCM
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(8 + self.public_key.len());
        out.extend_from_slice(&self.kem_id.to_be_bytes());
        out.extend_from_slice(&self.kdf_id.to_be_bytes());
        out.extend_from_slice(&self.aead_id.to_be_bytes());
        put_vec16(&mut out, &self.public_key, "public_key")?;
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let kem_id = r.u16("kem_id")?;
        let kdf_id = r.u16("kdf_id")?;
        let aead_id = r.u16("aead_id")?;
        let public_key = r.vec16("public_key")?.to_vec();
        r.finish()?;

        if public_key.is_empty() {
            return Err(CodecError::Empty("public_key"));
        }
        Ok(Self {
            kem_id,
            kdf_id,
            aead_id,
            public_key,
        })
    }

    /// `Expand(Extract("", contents), "odoh key id", Nh)`
    pub fn key_id(&self) -> Result<[u8; KEY_ID_LEN], CodecError> {
        let contents = self.encode()?;
        let hk = Hkdf::<Sha256>::new(None, &contents);
        let mut key_id = [0u8; KEY_ID_LEN];
        // KEY_ID_LEN == HashLen, always a valid output length
        hk.expand(KEY_ID_INFO, &mut key_id)
            .map_err(|_| CodecError::TooLong("key_id"))?;
        Ok(key_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObliviousDoHConfig {
    pub version: u16,
    pub contents: ObliviousDoHConfigContents,
}

impl ObliviousDoHConfig {
    pub fn new(contents: ObliviousDoHConfigContents) -> Self {
        Self {
            version: ODOH_VERSION,
            contents,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let contents = self.contents.encode()?;
        let mut out = Vec::with_capacity(4 + contents.len());
        out.extend_from_slice(&self.version.to_be_bytes());
        put_vec16(&mut out, &contents, "contents")?;
        Ok(out)
    }
}

/// The list served at `/.well-known/odohconfigs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObliviousDoHConfigs {
    pub configs: Vec<ObliviousDoHConfig>,
}

impl ObliviousDoHConfigs {
    pub fn new(configs: Vec<ObliviousDoHConfig>) -> Self {
        Self { configs }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut inner = Vec::new();
        for config in &self.configs {
            inner.extend_from_slice(&config.encode()?);
        }
        let mut out = Vec::with_capacity(2 + inner.len());
        put_vec16(&mut out, &inner, "configs")?;
        Ok(out)
    }

    /// Parse a config list, skipping entries with a version we do not know.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut outer = Reader::new(bytes);
        let list = outer.vec16("configs")?;
        outer.finish()?;

        let mut r = Reader::new(list);
        let mut configs = Vec::new();
        while r.remaining() > 0 {
            let version = r.u16("version")?;
            let contents = r.vec16("contents")?;
            if version != ODOH_VERSION {
                continue;
            }
            let contents = ObliviousDoHConfigContents::decode(contents)?;
            if !contents.is_supported_suite() {
                return Err(CodecError::UnsupportedSuite {
                    kem: contents.kem_id,
                    kdf: contents.kdf_id,
                    aead: contents.aead_id,
                });
            }
            configs.push(ObliviousDoHConfig { version, contents });
        }

        if configs.is_empty() {
            return Err(CodecError::UnsupportedVersion);
        }
        Ok(Self { configs })
    }

    /// First supported config, the one a client should encrypt to.
    pub fn preferred(&self) -> Option<&ObliviousDoHConfig> {
        self.configs.first()
    }
}
