// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ODoH query/response encryption (RFC 9230 Sections 6.2-6.5).
//
// Query:    HPKE base mode, info "odoh query",
//           encrypted_message = enc (32 bytes) || Seal(aad, Q_plain)
// Response: secret   = Export("odoh response", Nk)
//           salt     = Q_plain || len(response_nonce) || response_nonce
//           prk      = Extract(salt, secret)
//           key      = Expand(prk, "odoh key", Nk)
//           nonce    = Expand(prk, "odoh nonce", Nn)
//           encrypted_message = AES-128-GCM(key, nonce, aad, R_plain)

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead as _, KeyInit, Payload};
use aes_gcm::Aes128Gcm;
use hkdf::Hkdf;
use hpke::aead::AesGcm128;
use hpke::kdf::HkdfSha256;
use hpke::kem::X25519HkdfSha256;
use hpke::{Deserializable, Kem as KemTrait, OpModeR, OpModeS, Serializable};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::config::ObliviousDoHConfigContents;
use crate::error::{CodecError, CryptoError, OdohError};
use crate::message::{Message, MessageType, QueryBody};
use crate::wire::put_vec16;

pub(crate) type Kem = X25519HkdfSha256;
type Kdf = HkdfSha256;
type Aead = AesGcm128;

pub(crate) type PrivateKey = <Kem as KemTrait>::PrivateKey;
type PublicKey = <Kem as KemTrait>::PublicKey;
type EncappedKey = <Kem as KemTrait>::EncappedKey;

/// X25519 encapsulated key size (Nenc).
pub const ENC_LEN: usize = 32;
/// AES-128-GCM key size (Nk).
pub const AEAD_KEY_LEN: usize = 16;
/// AES-128-GCM nonce size (Nn).
pub const AEAD_NONCE_LEN: usize = 12;
/// AES-GCM authentication tag size.
pub const TAG_LEN: usize = 16;
/// Response nonce size: max(Nn, Nk).
pub const RESPONSE_NONCE_LEN: usize = 16;

const QUERY_INFO: &[u8] = b"odoh query";
const RESPONSE_EXPORT: &[u8] = b"odoh response";
const RESPONSE_KEY_INFO: &[u8] = b"odoh key";
const RESPONSE_NONCE_INFO: &[u8] = b"odoh nonce";

/// Target-side state for one request, derived while opening the query.
///
/// Consumed by [`ResponseContext::seal_response`], so a context can never
/// seal more than one response.
pub struct ResponseContext {
    query_plain: Vec<u8>,
    secret: [u8; AEAD_KEY_LEN],
}

/// Client-side state for one outstanding query.
pub struct QueryContext {
    query_plain: Vec<u8>,
    secret: [u8; AEAD_KEY_LEN],
}

/// Open an encrypted query with the target's secret key.
///
/// Returns the encoded plaintext body (`Q_plain`) and the context needed to
/// answer it. Every failure is reported as [`CryptoError::AuthFailure`].
pub(crate) fn open_query(
    secret_key: &PrivateKey,
    key_id: &[u8],
    encrypted: &[u8],
) -> Result<(Vec<u8>, ResponseContext), CryptoError> {
    if encrypted.len() < ENC_LEN + TAG_LEN {
        return Err(CryptoError::AuthFailure);
    }
    let (enc, ciphertext) = encrypted.split_at(ENC_LEN);

    let enc = EncappedKey::from_bytes(enc).map_err(|_| CryptoError::AuthFailure)?;
    let aad = Message::aad(MessageType::Query, key_id).map_err(|_| CryptoError::AuthFailure)?;

    let mut ctx = hpke::setup_receiver::<Aead, Kdf, Kem>(&OpModeR::Base, secret_key, &enc, QUERY_INFO)
        .map_err(|_| CryptoError::AuthFailure)?;
    let query_plain = ctx
        .open(ciphertext, &aad)
        .map_err(|_| CryptoError::AuthFailure)?;

    let mut secret = [0u8; AEAD_KEY_LEN];
    ctx.export(RESPONSE_EXPORT, &mut secret)
        .map_err(|_| CryptoError::AuthFailure)?;

    Ok((
        query_plain.clone(),
        ResponseContext {
            query_plain,
            secret,
        },
    ))
}

impl ResponseContext {
    /// Encrypt a response body so that only the creator of the matching
    /// query can open it.
    pub fn seal_response<R: RngCore + CryptoRng>(
        self,
        body: &QueryBody,
        rng: &mut R,
    ) -> Result<Message, CryptoError> {
        let response_plain = body.encode().map_err(|_| CryptoError::SealFailure)?;

        let mut response_nonce = [0u8; RESPONSE_NONCE_LEN];
        rng.try_fill_bytes(&mut response_nonce)
            .map_err(|_| CryptoError::SealFailure)?;

        let (key, nonce) = derive_response_keys(&self.secret, &self.query_plain, &response_nonce)
            .ok_or(CryptoError::SealFailure)?;
        let aad = Message::aad(MessageType::Response, &response_nonce)
            .map_err(|_| CryptoError::SealFailure)?;

        let cipher = Aes128Gcm::new(GenericArray::from_slice(&key));
        let ciphertext = cipher
            .encrypt(
                GenericArray::from_slice(&nonce),
                Payload {
                    msg: &response_plain,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::SealFailure)?;

        Ok(Message::response(response_nonce.to_vec(), ciphertext))
    }
}

/// Encrypt a query body to a published target config.
pub fn encrypt_query<R: RngCore + CryptoRng>(
    config: &ObliviousDoHConfigContents,
    body: &QueryBody,
    rng: &mut R,
) -> Result<(Message, QueryContext), OdohError> {
    if !config.is_supported_suite() {
        return Err(CodecError::UnsupportedSuite {
            kem: config.kem_id,
            kdf: config.kdf_id,
            aead: config.aead_id,
        }
        .into());
    }
    let public_key =
        PublicKey::from_bytes(&config.public_key).map_err(|_| CodecError::InvalidPublicKey)?;
    let key_id = config.key_id()?;
    let aad = Message::aad(MessageType::Query, &key_id)?;
    let query_plain = body.encode()?;

    let (enc, mut ctx) =
        hpke::setup_sender::<Aead, Kdf, Kem, _>(&OpModeS::Base, &public_key, QUERY_INFO, rng)
            .map_err(|_| CryptoError::SealFailure)?;
    let ciphertext = ctx
        .seal(&query_plain, &aad)
        .map_err(|_| CryptoError::SealFailure)?;

    let mut secret = [0u8; AEAD_KEY_LEN];
    ctx.export(RESPONSE_EXPORT, &mut secret)
        .map_err(|_| CryptoError::SealFailure)?;

    let mut payload = Vec::with_capacity(ENC_LEN + ciphertext.len());
    payload.extend_from_slice(&enc.to_bytes());
    payload.extend_from_slice(&ciphertext);

    Ok((
        Message::query(key_id.to_vec(), payload),
        QueryContext {
            query_plain,
            secret,
        },
    ))
}

impl QueryContext {
    /// Decrypt the target's answer to this query.
    pub fn open_response(self, response: &Message) -> Result<QueryBody, OdohError> {
        if response.message_type != MessageType::Response {
            return Err(CodecError::UnexpectedMessageType {
                expected: MessageType::Response.as_str(),
                got: response.message_type.as_str(),
            }
            .into());
        }

        let (key, nonce) = derive_response_keys(&self.secret, &self.query_plain, &response.key_id)
            .ok_or(CryptoError::AuthFailure)?;
        let aad = Message::aad(MessageType::Response, &response.key_id)?;

        let cipher = Aes128Gcm::new(GenericArray::from_slice(&key));
        let plain = cipher
            .decrypt(
                GenericArray::from_slice(&nonce),
                Payload {
                    msg: &response.encrypted_payload,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::AuthFailure)?;

        Ok(QueryBody::decode(&plain)?)
    }
}

fn derive_response_keys(
    secret: &[u8],
    query_plain: &[u8],
    response_nonce: &[u8],
) -> Option<([u8; AEAD_KEY_LEN], [u8; AEAD_NONCE_LEN])> {
    let mut salt = Vec::with_capacity(query_plain.len() + 2 + response_nonce.len());
    salt.extend_from_slice(query_plain);
    put_vec16(&mut salt, response_nonce, "response_nonce").ok()?;

    let hk = Hkdf::<Sha256>::new(Some(&salt), secret);
    let mut key = [0u8; AEAD_KEY_LEN];
    let mut nonce = [0u8; AEAD_NONCE_LEN];
    hk.expand(RESPONSE_KEY_INFO, &mut key).ok()?;
    hk.expand(RESPONSE_NONCE_INFO, &mut nonce).ok()?;
    Some((key, nonce))
}

/// Public key bytes for a secret key, used when building the config.
pub(crate) fn derive_keypair(seed: &[u8]) -> (PrivateKey, Vec<u8>) {
    let (sk, pk) = Kem::derive_keypair(seed);
    (sk, pk.to_bytes().to_vec())
}
