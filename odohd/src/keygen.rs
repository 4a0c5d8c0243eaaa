// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `odohd keygen`: provision a seed that several targets can share.

use base64::Engine;
use rand::{CryptoRng, RngCore};

use odoh_common::{KeyError, KeyManager, KeyPair, SEED_LEN};

/// A fresh seed, base64-encoded the way `--seed-file` expects it.
pub struct Provisioned {
    pub seed: String,
    pub keys: KeyManager,
}

impl Provisioned {
    pub fn key_id(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.keys.key_id())
    }

    pub fn configs(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.keys.config())
    }
}

pub fn keygen<R: RngCore + CryptoRng>(entropy: &mut R) -> Result<Provisioned, KeyError> {
    let mut seed = [0u8; SEED_LEN];
    entropy
        .try_fill_bytes(&mut seed)
        .map_err(|e| KeyError::Entropy(e.to_string()))?;
    let keys = KeyManager::new(KeyPair::from_seed(&seed)?)?;

    Ok(Provisioned {
        seed: base64::engine::general_purpose::STANDARD.encode(seed),
        keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use odoh_common::{KeyStore, SeedFileKeyStore};
    use rand::rngs::OsRng;
    use std::io::Write;

    #[test]
    fn seed_round_trips_through_seed_file() {
        let provisioned = keygen(&mut OsRng).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", provisioned.seed).unwrap();
        let loaded = SeedFileKeyStore::new(file.path()).load().unwrap().unwrap();

        assert_eq!(loaded.key_id(), provisioned.keys.key_id());
    }

    #[test]
    fn fresh_seeds_differ() {
        let a = keygen(&mut OsRng).unwrap();
        let b = keygen(&mut OsRng).unwrap();
        assert_ne!(a.seed, b.seed);
        assert_ne!(a.key_id(), b.key_id());
    }
}
