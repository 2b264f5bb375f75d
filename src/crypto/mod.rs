// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Endpoint Encryption Module
//!
//! Cryptographic primitives for two-party payload encryption:
//!
//! - **ECDH**: Key pair generation and one-shot agreement on NIST P-256
//! - **Encryption**: AES keyed by the raw shared secret (legacy ECB format, opt-in AES-GCM)
//! - **Codec**: base64 text, SPKI/PKCS#8 key reconstruction, endpoint records
//! - **Fixed Key**: pre-shared or random symmetric keys for encryption at rest
//!
//! ## Security Considerations
//!
//! - Peer public keys are trusted on receipt; there is no authentication
//! - The legacy format has no IV and no integrity protection
//! - `decrypt` fails open and returns its input on failure; use `try_decrypt`
//!   when the caller must know whether decryption worked
//! - Private keys and shared secrets never leave the process and are never logged
//!
//! ## Protocol Flow
//!
//! 1. Each side creates an `EncryptionEndpoint` (fresh key pair)
//! 2. Public keys are exchanged out of band
//! 3. Each side derives the shared secret from the peer's public key
//! 4. Payloads are encrypted with the shared secret and decrypted by the peer

pub mod aes_gcm;
pub mod codec;
pub mod ecdh;
pub mod encryption;
pub mod endpoint;
pub mod endpoint_codec;
pub mod error;
pub mod fixed_key;
pub mod helpers;

pub use codec::{decode_key, encode_key, fingerprint, KeyCodec};
pub use ecdh::{derive_shared_secret, generate, Curve, GeneratedKeys, KeyAgreement, KeySize, SharedSecret};
pub use encryption::{CipherFormat, SymmetricCipher};
pub use endpoint::{Encryption, EncryptionEndpoint, EndpointFactory};
pub use endpoint_codec::{deserialize_endpoint, serialize_endpoint, PersistedEndpointRecord, NULL_SENTINEL};
pub use error::{CipherErrorKind, CryptoError, CryptoResult};
pub use fixed_key::{FixedKeyEncryption, KeyProvider, RandomKey, StaticKey, SymmetricKey};
pub use helpers::{decrypt_all, decrypt_str, encrypt_all, encrypt_str};

pub use p256::{PublicKey, SecretKey};
