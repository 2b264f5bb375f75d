// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-GCM Payload Format (format version 1)
//!
//! Authenticated alternative to the legacy ECB format. Only used when both
//! peers are configured with `CipherFormat::AesGcm`; payloads are never
//! auto-detected.
//!
//! **Encryption Format**:
//! ```text
//! [nonce (12 bytes) | ciphertext+tag (variable length)]
//! ```
//!
//! - Nonce: 12 bytes, random per encryption
//! - Tag: 16 bytes appended by AES-GCM
//! - Key: 16 bytes (AES-128-GCM) or 32 bytes (AES-256-GCM)
//! - No Additional Authenticated Data

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes128Gcm, Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::error::{CipherErrorKind, CryptoError, CryptoResult};

/// Nonce length in bytes
pub const NONCE_SIZE: usize = 12;

/// Authentication tag length in bytes
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under a fresh random nonce
///
/// Returns `nonce || ciphertext+tag`.
pub fn encrypt_aes_gcm(plaintext: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let payload = Payload {
        msg: plaintext,
        aad: b"",
    };

    let ciphertext = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::cipher(CipherErrorKind::Encrypt, e.to_string()))?
            .encrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::cipher(CipherErrorKind::Encrypt, e.to_string()))?
            .encrypt(nonce, payload),
        n => {
            return Err(CryptoError::cipher(
                CipherErrorKind::Encrypt,
                format!("invalid AES-GCM key size: expected 16 or 32 bytes, got {}", n),
            ))
        }
    }
    .map_err(|e| CryptoError::cipher(CipherErrorKind::Encrypt, format!("AES-GCM encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt `nonce || ciphertext+tag`
///
/// # Errors
///
/// - `Decrypt` if the data is shorter than nonce + tag or the key size is wrong
/// - `WrongKey` if the authentication tag does not verify
pub fn decrypt_aes_gcm(encrypted: &[u8], key: &[u8]) -> CryptoResult<Vec<u8>> {
    if encrypted.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::cipher(
            CipherErrorKind::Decrypt,
            format!(
                "encrypted data too short: expected at least {} bytes, got {}",
                NONCE_SIZE + TAG_SIZE,
                encrypted.len()
            ),
        ));
    }

    let nonce = Nonce::from_slice(extract_nonce(encrypted)?);
    let payload = Payload {
        msg: &encrypted[NONCE_SIZE..],
        aad: b"",
    };

    let plaintext = match key.len() {
        16 => Aes128Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::cipher(CipherErrorKind::Decrypt, e.to_string()))?
            .decrypt(nonce, payload),
        32 => Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::cipher(CipherErrorKind::Decrypt, e.to_string()))?
            .decrypt(nonce, payload),
        n => {
            return Err(CryptoError::cipher(
                CipherErrorKind::Decrypt,
                format!("invalid AES-GCM key size: expected 16 or 32 bytes, got {}", n),
            ))
        }
    };

    plaintext.map_err(|_| {
        CryptoError::cipher(
            CipherErrorKind::WrongKey,
            "AES-GCM authentication failed (wrong key or corrupted data)",
        )
    })
}

/// The 12-byte nonce prefix of `encrypted`
pub fn extract_nonce(encrypted: &[u8]) -> CryptoResult<&[u8]> {
    encrypted.get(..NONCE_SIZE).ok_or_else(|| {
        CryptoError::cipher(
            CipherErrorKind::Decrypt,
            format!(
                "cannot extract nonce: data too short (expected at least {} bytes, got {})",
                NONCE_SIZE,
                encrypted.len()
            ),
        )
    })
}
