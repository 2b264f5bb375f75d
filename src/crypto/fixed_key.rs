// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed-Key Encryption
//!
//! Encryption with a symmetric key supplied up front, no agreement step.
//! Meant for encryption at rest (local storage, config secrets) rather than
//! two-party exchange.
//!
//! The key is taken from a [`KeyProvider`] exactly once, when the
//! [`FixedKeyEncryption`] is built, and reused for every call afterwards.
//! The same format caveats as [`super::encryption`] apply.

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use super::endpoint::Encryption;
use super::encryption::SymmetricCipher;
use super::error::{CryptoError, CryptoResult};

/// AES key, zeroized on drop
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(Zeroizing<Vec<u8>>);

impl SymmetricKey {
    /// Wrap raw key bytes (16, 24 or 32 bytes)
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self(Zeroizing::new(bytes.to_vec()))),
            n => Err(CryptoError::key_decode(
                "symmetric_key",
                format!("expected 16, 24 or 32 bytes, got {}", n),
            )),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey([REDACTED; {} bits])", self.bits())
    }
}

/// Source of a symmetric key
#[cfg_attr(test, mockall::automock)]
pub trait KeyProvider {
    fn get(&self) -> CryptoResult<SymmetricKey>;
}

/// Generates a fresh random AES key on every call
#[derive(Debug, Clone, Copy)]
pub struct RandomKey {
    bits: u32,
}

impl RandomKey {
    pub fn new(bits: u32) -> Self {
        Self { bits }
    }
}

impl KeyProvider for RandomKey {
    fn get(&self) -> CryptoResult<SymmetricKey> {
        if !matches!(self.bits, 128 | 192 | 256) {
            return Err(CryptoError::KeyGeneration {
                key_size: format!("{}-bit", self.bits),
                reason: "AES keys must be 128, 192 or 256 bits".to_string(),
            });
        }
        let mut bytes = Zeroizing::new(vec![0u8; self.bits as usize / 8]);
        OsRng.fill_bytes(&mut bytes);
        SymmetricKey::from_bytes(&bytes)
    }
}

/// Hands out a pre-shared key
#[derive(Debug, Clone)]
pub struct StaticKey {
    key: SymmetricKey,
}

impl StaticKey {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        SymmetricKey::from_bytes(bytes).map(Self::new)
    }
}

impl KeyProvider for StaticKey {
    fn get(&self) -> CryptoResult<SymmetricKey> {
        Ok(self.key.clone())
    }
}

/// Cipher bound to one symmetric key for its whole lifetime
pub struct FixedKeyEncryption {
    key: SymmetricKey,
    cipher: SymmetricCipher,
}

impl FixedKeyEncryption {
    /// Fetch the key from `provider` (once) and bind it to `cipher`
    pub fn new(provider: &dyn KeyProvider, cipher: SymmetricCipher) -> CryptoResult<Self> {
        let key = provider.get()?;
        Ok(Self { key, cipher })
    }

    pub fn key_bits(&self) -> usize {
        self.key.bits()
    }

    pub fn try_encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        self.cipher.try_encrypt(self.key.as_bytes(), plaintext)
    }

    pub fn try_decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        self.cipher.try_decrypt(self.key.as_bytes(), ciphertext)
    }
}

impl Encryption for FixedKeyEncryption {
    fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        self.cipher.encrypt(self.key.as_bytes(), data)
    }

    fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        self.cipher.decrypt(self.key.as_bytes(), data)
    }
}

impl fmt::Debug for FixedKeyEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedKeyEncryption")
            .field("key", &self.key)
            .field("cipher", &self.cipher)
            .finish()
    }
}
