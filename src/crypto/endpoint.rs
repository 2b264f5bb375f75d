// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encryption Endpoint
//!
//! One side's cryptographic state for a single peer relationship: its key
//! pair, the one-shot agreement handle, the shared secret once derived, and
//! an `active` kill switch.
//!
//! ## Protocol Flow
//!
//! 1. Each side creates an endpoint (fresh key pair, no secret)
//! 2. Public keys are exchanged out of band (SPKI DER, usually base64)
//! 3. Each side calls [`EncryptionEndpoint::derive_shared_secret`] with the peer key
//! 4. Both hold the same secret; either side encrypts, the other decrypts
//!
//! ## Concurrency
//!
//! The endpoint is not internally synchronized. Mutation only happens through
//! `&mut self` ([`EncryptionEndpoint::derive_shared_secret`],
//! [`EncryptionEndpoint::set_active`]); callers that share an endpoint
//! between threads wrap it in their own mutex. Encrypt/decrypt take `&self`.
//!
//! ## Agreement Policy
//!
//! The agreement handle is spent by the first successful derivation. A
//! second call is rejected with `KeyAgreement` and leaves the existing
//! secret untouched. An endpoint loaded with a stored secret has no handle.
//!
//! ## Security Considerations
//!
//! - The private key and the shared secret are never logged; `Debug` redacts them
//! - Both are zeroized when the endpoint is dropped
//! - Peer public keys are trusted as received (no authentication)

use std::fmt;
use std::sync::Arc;

use p256::{PublicKey, SecretKey};

use super::codec::{self, KeyCodec};
use super::ecdh::{self, Curve, KeyAgreement, KeySize, SharedSecret};
use super::encryption::{CipherFormat, SymmetricCipher};
use super::error::{CipherErrorKind, CryptoError, CryptoResult};
use crate::config::EndpointConfig;
use crate::logging::{LogLevel, LogSink, TracingSink};

/// Something that can encrypt and decrypt byte payloads
///
/// Both methods fail open: on failure they log and return their input.
pub trait Encryption {
    fn encrypt(&self, data: &[u8]) -> Vec<u8>;
    fn decrypt(&self, data: &[u8]) -> Vec<u8>;
}

struct KeyPair {
    public_key: PublicKey,
    private_key: SecretKey,
}

/// ECDH endpoint
pub struct EncryptionEndpoint {
    keys: Option<KeyPair>,
    agreement: Option<KeyAgreement>,
    shared_secret: Option<SharedSecret>,
    active: bool,
    cipher: SymmetricCipher,
    sink: Arc<dyn LogSink>,
}

impl EncryptionEndpoint {
    /// Create an endpoint with a fresh key pair
    ///
    /// If no curve of the requested size is available the `KeyGeneration`
    /// error is logged and the endpoint is returned without keys. Such an
    /// endpoint can never become usable.
    pub fn generate(size: KeySize, cipher: SymmetricCipher, sink: Arc<dyn LogSink>) -> Self {
        match ecdh::generate(size) {
            Ok(generated) => {
                let endpoint = Self {
                    keys: Some(KeyPair {
                        public_key: generated.public_key,
                        private_key: generated.private_key,
                    }),
                    agreement: Some(generated.agreement),
                    shared_secret: None,
                    active: true,
                    cipher,
                    sink,
                };
                endpoint.sink.log(
                    LogLevel::Debug,
                    &format!(
                        "Generated {} endpoint key pair on {} (fingerprint {})",
                        size,
                        size.curve().map(Curve::name).unwrap_or("unknown curve"),
                        endpoint.fingerprint().unwrap_or_default()
                    ),
                );
                endpoint
            }
            Err(e) => {
                sink.log_error(LogLevel::Error, "Error initializing encryption endpoint", &e);
                Self {
                    keys: None,
                    agreement: None,
                    shared_secret: None,
                    active: true,
                    cipher,
                    sink,
                }
            }
        }
    }

    /// Rebuild an endpoint from encoded key material
    ///
    /// `encoded_public` is SPKI DER, `encoded_private` is PKCS#8 DER and
    /// `shared_secret` is the raw secret, if one had been derived.
    ///
    /// # Errors
    ///
    /// `InvalidEncryption` if either key is missing, fails to decode, or the
    /// two keys do not form a pair, or if the stored secret is not 16, 24 or
    /// 32 bytes long.
    pub fn load(
        encoded_public: Option<&[u8]>,
        encoded_private: Option<&[u8]>,
        shared_secret: Option<&[u8]>,
        codec: &KeyCodec,
        cipher: SymmetricCipher,
        sink: Arc<dyn LogSink>,
    ) -> CryptoResult<Self> {
        let (Some(public_bytes), Some(private_bytes)) = (encoded_public, encoded_private) else {
            return Err(CryptoError::InvalidEncryption(
                "The public or private key is missing".to_string(),
            ));
        };

        let invalid = || CryptoError::InvalidEncryption("The public or private key is invalid".to_string());
        let public_key = codec.reconstruct_public_key(public_bytes).ok_or_else(invalid)?;
        let private_key = codec.reconstruct_private_key(private_bytes).ok_or_else(invalid)?;

        if private_key.public_key() != public_key {
            return Err(CryptoError::InvalidEncryption(
                "The public key does not belong to the private key".to_string(),
            ));
        }

        let shared_secret = match shared_secret {
            Some(bytes) if !matches!(bytes.len(), 16 | 24 | 32) => {
                return Err(CryptoError::InvalidEncryption(format!(
                    "The stored shared secret has an invalid length of {} bytes",
                    bytes.len()
                )))
            }
            Some(bytes) => Some(SharedSecret::from_bytes(bytes)),
            None => None,
        };

        // A stored secret means the agreement already ran
        let agreement = match shared_secret {
            Some(_) => None,
            None => Some(KeyAgreement::new(&private_key)),
        };

        Ok(Self {
            keys: Some(KeyPair {
                public_key,
                private_key,
            }),
            agreement,
            shared_secret,
            active: true,
            cipher,
            sink,
        })
    }

    /// Derive the shared secret from the peer's public key
    ///
    /// On failure the error is logged, returned, and the endpoint is left as
    /// it was. Check [`EncryptionEndpoint::is_usable`] afterwards.
    pub fn derive_shared_secret(&mut self, peer: &PublicKey) -> CryptoResult<()> {
        let result = self.complete_agreement(peer);
        match &result {
            Ok(()) => self.sink.log(
                LogLevel::Debug,
                &format!(
                    "Shared secret established with peer {}",
                    codec::public_key_der(peer)
                        .map(|der| codec::fingerprint(&der))
                        .unwrap_or_default()
                ),
            ),
            Err(e) => self.sink.log_error(LogLevel::Error, "Invalid key", e),
        }
        result
    }

    /// Decode a transported SPKI public key and derive the shared secret from it
    ///
    /// A key that does not decode (wrong curve, malformed) is a `KeyAgreement` error.
    pub fn derive_shared_secret_from_encoded(
        &mut self,
        peer_public: &[u8],
        codec: &KeyCodec,
    ) -> CryptoResult<()> {
        match codec.try_reconstruct_public_key(peer_public) {
            Ok(peer) => self.derive_shared_secret(&peer),
            Err(e) => {
                let err = CryptoError::KeyAgreement {
                    reason: format!("invalid peer public key: {}", e),
                };
                self.sink.log_error(LogLevel::Error, "Invalid key", &err);
                Err(err)
            }
        }
    }

    fn complete_agreement(&mut self, peer: &PublicKey) -> CryptoResult<()> {
        if self.shared_secret.is_some() {
            return Err(CryptoError::KeyAgreement {
                reason: "shared secret already established; the agreement handle is spent"
                    .to_string(),
            });
        }
        let agreement = self.agreement.take().ok_or_else(|| CryptoError::KeyAgreement {
            reason: "endpoint has no key pair".to_string(),
        })?;
        self.shared_secret = Some(agreement.complete(peer));
        Ok(())
    }

    /// Shared secret present and endpoint active
    pub fn is_usable(&self) -> bool {
        self.shared_secret.is_some() && self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Kill switch: an inactive endpoint reports unusable and refuses to encrypt or decrypt
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.sink.log(
                LogLevel::Info,
                &format!("Encryption endpoint {}", if active { "activated" } else { "deactivated" }),
            );
        }
        self.active = active;
    }

    /// False if key generation failed
    pub fn has_key_pair(&self) -> bool {
        self.keys.is_some()
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.keys.as_ref().map(|k| &k.public_key)
    }

    /// SPKI DER of the public key, the form sent to the peer
    pub fn encoded_public_key(&self) -> Option<Vec<u8>> {
        self.public_key().and_then(|k| codec::public_key_der(k).ok())
    }

    /// Must never leave this process
    pub(crate) fn private_key(&self) -> Option<&SecretKey> {
        self.keys.as_ref().map(|k| &k.private_key)
    }

    /// Must never leave this process
    pub fn shared_secret(&self) -> Option<&SharedSecret> {
        self.shared_secret.as_ref()
    }

    /// Log-safe fingerprint of the public key
    pub fn fingerprint(&self) -> Option<String> {
        self.encoded_public_key().map(|der| codec::fingerprint(&der))
    }

    pub fn cipher_format(&self) -> CipherFormat {
        self.cipher.format()
    }

    fn usable_secret(&self, kind: CipherErrorKind) -> CryptoResult<&SharedSecret> {
        let secret = self.shared_secret.as_ref().ok_or_else(|| {
            CryptoError::cipher(kind, "no shared secret; the peer's public key was never supplied")
        })?;
        if !self.active {
            return Err(CryptoError::cipher(kind, "endpoint is inactive"));
        }
        Ok(secret)
    }

    /// Encrypt with the shared secret, returning the error instead of failing open
    pub fn try_encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let secret = self.usable_secret(CipherErrorKind::Encrypt)?;
        self.cipher.try_encrypt(secret.as_bytes(), plaintext)
    }

    /// Decrypt with the shared secret, returning the error instead of failing open
    pub fn try_decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let secret = self.usable_secret(CipherErrorKind::Decrypt)?;
        self.cipher.try_decrypt(secret.as_bytes(), ciphertext)
    }
}

impl Encryption for EncryptionEndpoint {
    fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        match self.usable_secret(CipherErrorKind::Encrypt) {
            Ok(secret) => self.cipher.encrypt(secret.as_bytes(), data),
            Err(e) => {
                self.sink
                    .log_error(LogLevel::Warn, "Error encrypting! Endpoint is not usable", &e);
                data.to_vec()
            }
        }
    }

    fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        match self.usable_secret(CipherErrorKind::Decrypt) {
            Ok(secret) => self.cipher.decrypt(secret.as_bytes(), data),
            Err(e) => {
                self.sink
                    .log_error(LogLevel::Error, "Error decrypting! Endpoint is not usable", &e);
                data.to_vec()
            }
        }
    }
}

impl fmt::Debug for EncryptionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionEndpoint")
            .field("public_key", &self.fingerprint())
            .field("private_key", &self.keys.as_ref().map(|_| "[REDACTED]"))
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "[REDACTED]"))
            .field("active", &self.active)
            .field("format", &self.cipher.format())
            .finish()
    }
}

/// Builds endpoints that share a key size, cipher format and log sink
#[derive(Clone)]
pub struct EndpointFactory {
    size: KeySize,
    codec: KeyCodec,
    cipher: SymmetricCipher,
    sink: Arc<dyn LogSink>,
}

impl EndpointFactory {
    pub fn new(size: KeySize, format: CipherFormat, sink: Arc<dyn LogSink>) -> Self {
        Self {
            size,
            codec: KeyCodec::new(sink.clone()),
            cipher: SymmetricCipher::new(format, sink.clone()),
            sink,
        }
    }

    pub fn from_config(config: &EndpointConfig, sink: Arc<dyn LogSink>) -> Self {
        Self::new(config.key_size, config.cipher_format, sink)
    }

    pub fn key_size(&self) -> KeySize {
        self.size
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn cipher(&self) -> &SymmetricCipher {
        &self.cipher
    }

    /// New endpoint with a fresh key pair
    pub fn create(&self) -> EncryptionEndpoint {
        EncryptionEndpoint::generate(self.size, self.cipher.clone(), self.sink.clone())
    }

    /// Rebuild an endpoint from encoded key material
    pub fn load(
        &self,
        encoded_public: Option<&[u8]>,
        encoded_private: Option<&[u8]>,
        shared_secret: Option<&[u8]>,
    ) -> CryptoResult<EncryptionEndpoint> {
        EncryptionEndpoint::load(
            encoded_public,
            encoded_private,
            shared_secret,
            &self.codec,
            self.cipher.clone(),
            self.sink.clone(),
        )
    }
}

impl Default for EndpointFactory {
    fn default() -> Self {
        Self::new(KeySize::default(), CipherFormat::default(), TracingSink::shared())
    }
}

impl fmt::Debug for EndpointFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointFactory")
            .field("size", &self.size)
            .field("format", &self.cipher.format())
            .finish_non_exhaustive()
    }
}
