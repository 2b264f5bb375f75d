// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Convenience wrappers over any [`Encryption`].

use super::endpoint::Encryption;

/// Encrypt a UTF-8 string; the ciphertext is base64 text
pub fn encrypt_str(encryption: &dyn Encryption, value: &str) -> String {
    String::from_utf8_lossy(&encryption.encrypt(value.as_bytes())).into_owned()
}

/// Decrypt to a UTF-8 string
///
/// Invalid UTF-8 is replaced, not rejected. On a failed decrypt this returns
/// `value` itself (fail-open).
pub fn decrypt_str(encryption: &dyn Encryption, value: &str) -> String {
    String::from_utf8_lossy(&encryption.decrypt(value.as_bytes())).into_owned()
}

/// Encrypt every chunk in place
pub fn encrypt_all(encryption: &dyn Encryption, chunks: &mut [Vec<u8>]) {
    for chunk in chunks.iter_mut() {
        *chunk = encryption.encrypt(chunk);
    }
}

/// Decrypt every chunk in place
pub fn decrypt_all(encryption: &dyn Encryption, chunks: &mut [Vec<u8>]) {
    for chunk in chunks.iter_mut() {
        *chunk = encryption.decrypt(chunk);
    }
}
