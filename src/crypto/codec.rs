// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key Codec
//!
//! Moves key material between its in-memory form and a transport-safe text form.
//!
//! **Formats**:
//! - Public key: SubjectPublicKeyInfo DER
//! - Private key: PKCS#8 DER
//! - Text: standard base64 with padding (decoding also accepts unpadded input)
//!
//! Reconstruction parses against NIST P-256, the only curve endpoints are
//! generated on. Anything else is a `KeyDecode` error.

use std::fmt;
use std::sync::Arc;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use p256::{PublicKey, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::error::{CryptoError, CryptoResult};
use crate::logging::{LogLevel, LogSink};

const KEY_TEXT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode raw key bytes as base64 text
pub fn encode_key(raw: &[u8]) -> String {
    KEY_TEXT.encode(raw)
}

/// Decode base64 text back to raw key bytes
pub fn decode_key(text: &str) -> CryptoResult<Vec<u8>> {
    Ok(KEY_TEXT.decode(text.trim())?)
}

/// SPKI DER encoding of a public key
pub fn public_key_der(key: &PublicKey) -> CryptoResult<Vec<u8>> {
    key.to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| CryptoError::key_decode("public_key", e))
}

/// PKCS#8 DER encoding of a private key
pub fn private_key_der(key: &SecretKey) -> CryptoResult<Zeroizing<Vec<u8>>> {
    key.to_pkcs8_der()
        .map(|doc| Zeroizing::new(doc.as_bytes().to_vec()))
        .map_err(|e| CryptoError::key_decode("private_key", e))
}

/// Short fingerprint of a public key, safe to log
///
/// First 8 bytes of SHA-256 over the SPKI DER, hex encoded.
pub fn fingerprint(public_der: &[u8]) -> String {
    let digest = Sha256::digest(public_der);
    hex::encode(&digest[..8])
}

/// Rebuilds key objects from encoded bytes, logging failures to its sink
#[derive(Clone)]
pub struct KeyCodec {
    sink: Arc<dyn LogSink>,
}

impl KeyCodec {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Parse an SPKI DER public key
    pub fn try_reconstruct_public_key(&self, bytes: &[u8]) -> CryptoResult<PublicKey> {
        PublicKey::from_public_key_der(bytes).map_err(|e| CryptoError::key_decode("public_key", e))
    }

    /// Parse a PKCS#8 DER private key
    pub fn try_reconstruct_private_key(&self, bytes: &[u8]) -> CryptoResult<SecretKey> {
        SecretKey::from_pkcs8_der(bytes).map_err(|e| CryptoError::key_decode("private_key", e))
    }

    /// Parse a public key; on failure logs the `KeyDecode` error and returns `None`
    pub fn reconstruct_public_key(&self, bytes: &[u8]) -> Option<PublicKey> {
        match self.try_reconstruct_public_key(bytes) {
            Ok(key) => Some(key),
            Err(e) => {
                self.sink
                    .log_error(LogLevel::Warn, "Error retrieving public key", &e);
                None
            }
        }
    }

    /// Parse a private key; on failure logs the `KeyDecode` error and returns `None`
    pub fn reconstruct_private_key(&self, bytes: &[u8]) -> Option<SecretKey> {
        match self.try_reconstruct_private_key(bytes) {
            Ok(key) => Some(key),
            Err(e) => {
                self.sink
                    .log_error(LogLevel::Warn, "Error retrieving private key", &e);
                None
            }
        }
    }
}

impl fmt::Debug for KeyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCodec").finish_non_exhaustive()
    }
}
