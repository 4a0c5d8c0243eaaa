// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Target key lifecycle: seed -> HPKE keypair -> published config.
//
// The secret key never leaves this module: there is no accessor, no
// serializer, and the Debug impl redacts it.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use base64::Engine;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::info;

use crate::config::{ObliviousDoHConfig, ObliviousDoHConfigContents, ObliviousDoHConfigs};
use crate::crypto::{self, PrivateKey, ResponseContext};
use crate::error::{CodecError, CryptoError};
use crate::message::{Message, MessageType};

/// Seed length: as many bytes of entropy as the X25519 secret key has bits / 8.
pub const SEED_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("entropy source failed: {0}")]
    Entropy(String),

    #[error("seed too short: need at least {need} bytes, got {got}")]
    SeedTooShort { need: usize, got: usize },

    #[error("failed to read seed file {}: {source}", path.display())]
    SeedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seed file {} is neither 32 raw bytes nor base64", .0.display())]
    SeedEncoding(PathBuf),

    #[error("config encoding failed: {0}")]
    Codec(#[from] CodecError),
}

/// The target's HPKE keypair together with the config that publishes it.
pub struct KeyPair {
    config: ObliviousDoHConfigContents,
    key_id: Vec<u8>,
    secret_key: PrivateKey,
}

impl KeyPair {
    /// Draw a fresh seed from `entropy` and derive a keypair from it.
    pub fn generate<R: RngCore + CryptoRng>(entropy: &mut R) -> Result<Self, KeyError> {
        let mut seed = [0u8; SEED_LEN];
        entropy
            .try_fill_bytes(&mut seed)
            .map_err(|e| KeyError::Entropy(e.to_string()))?;
        Self::from_seed(&seed)
    }

    /// Deterministically derive a keypair (HPKE `DeriveKeyPair`).
    pub fn from_seed(seed: &[u8]) -> Result<Self, KeyError> {
        if seed.len() < SEED_LEN {
            return Err(KeyError::SeedTooShort {
                need: SEED_LEN,
                got: seed.len(),
            });
        }

        let (secret_key, public_key) = crypto::derive_keypair(seed);
        let config = ObliviousDoHConfigContents::x25519_sha256_aes128gcm(public_key);
        let key_id = config.key_id()?.to_vec();

        Ok(Self {
            config,
            key_id,
            secret_key,
        })
    }

    pub fn config(&self) -> &ObliviousDoHConfigContents {
        &self.config
    }

    pub fn key_id(&self) -> &[u8] {
        &self.key_id
    }

    /// Decapsulate and decrypt a query addressed to this keypair.
    ///
    /// Returns the encoded plaintext body and the per-request context used to
    /// seal the answer.
    pub fn open_query(&self, query: &Message) -> Result<(Vec<u8>, ResponseContext), CryptoError> {
        if query.message_type != MessageType::Query {
            return Err(CryptoError::AuthFailure);
        }
        if query.key_id != self.key_id {
            return Err(CryptoError::StaleKey);
        }
        crypto::open_query(&self.secret_key, &query.key_id, &query.encrypted_payload)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("config", &self.config)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Owns the target's keypair and its canonical published encoding.
///
/// The config bytes are encoded once at construction and never change for
/// the lifetime of the manager. Reads take no lock.
#[derive(Debug)]
pub struct KeyManager {
    key_pair: KeyPair,
    configs: Vec<u8>,
}

impl KeyManager {
    pub fn new(key_pair: KeyPair) -> Result<Self, KeyError> {
        let configs =
            ObliviousDoHConfigs::new(vec![ObliviousDoHConfig::new(key_pair.config.clone())])
                .encode()?;
        Ok(Self { key_pair, configs })
    }

    /// Load a keypair from `store`, generating one when it has none, then
    /// publish it.
    pub fn from_store(store: &dyn KeyStore) -> Result<Self, KeyError> {
        let key_pair = match store.load()? {
            Some(kp) => kp,
            None => store.generate()?,
        };
        store.publish(&key_pair)?;
        Self::new(key_pair)
    }

    /// Canonical `ObliviousDoHConfigs` bytes.
    pub fn config(&self) -> &[u8] {
        &self.configs
    }

    pub fn key_id(&self) -> &[u8] {
        self.key_pair.key_id()
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }
}

/// Where the target's keypair comes from.
///
/// There is no rotation: a manager asks the store once at startup.
pub trait KeyStore: Send + Sync {
    /// A previously provisioned keypair, if any.
    fn load(&self) -> Result<Option<KeyPair>, KeyError>;

    /// Create a new keypair.
    fn generate(&self) -> Result<KeyPair, KeyError>;

    /// Announce the keypair that is about to be served.
    fn publish(&self, key_pair: &KeyPair) -> Result<(), KeyError>;
}

/// A fresh keypair per process, nothing persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralKeyStore;

impl KeyStore for EphemeralKeyStore {
    fn load(&self) -> Result<Option<KeyPair>, KeyError> {
        Ok(None)
    }

    fn generate(&self) -> Result<KeyPair, KeyError> {
        KeyPair::generate(&mut OsRng)
    }

    fn publish(&self, key_pair: &KeyPair) -> Result<(), KeyError> {
        log_published(key_pair, "ephemeral");
        Ok(())
    }
}

/// Seed provisioned by the operator (see `odohd keygen`), so several target
/// instances can serve the same config.
///
/// The file holds either 32 raw bytes or the base64 encoding of the seed. A
/// missing file means "no keypair"; generation then falls back to the OS RNG
/// and nothing is written back.
#[derive(Debug, Clone)]
pub struct SeedFileKeyStore {
    path: PathBuf,
}

impl SeedFileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeyStore for SeedFileKeyStore {
    fn load(&self) -> Result<Option<KeyPair>, KeyError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(KeyError::SeedFile {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let seed = decode_seed(&raw).ok_or_else(|| KeyError::SeedEncoding(self.path.clone()))?;
        KeyPair::from_seed(&seed).map(Some)
    }

    fn generate(&self) -> Result<KeyPair, KeyError> {
        KeyPair::generate(&mut OsRng)
    }

    fn publish(&self, key_pair: &KeyPair) -> Result<(), KeyError> {
        log_published(key_pair, "seed-file");
        Ok(())
    }
}

/// Accept the base64 text `odohd keygen` prints, or raw seed bytes.
fn decode_seed(raw: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(raw).ok().map(str::trim);
    if let Some(text) = text {
        if let Ok(seed) = base64::engine::general_purpose::STANDARD.decode(text) {
            if seed.len() >= SEED_LEN {
                return Some(seed);
            }
        }
    }
    (raw.len() == SEED_LEN).then(|| raw.to_vec())
}

fn log_published(key_pair: &KeyPair, store: &'static str) {
    let b64 = base64::engine::general_purpose::STANDARD;
    info!(
        store,
        key_id = %b64.encode(key_pair.key_id()),
        public_key = %b64.encode(&key_pair.config().public_key),
        "publishing ODoH config"
    );
}
