// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Symmetric Cipher
//!
//! Encrypts payloads with a raw symmetric key (normally an ECDH shared
//! secret). The key bytes select the AES variant directly:
//! 16 bytes = AES-128, 24 = AES-192, 32 = AES-256.
//!
//! ## Formats
//!
//! - [`CipherFormat::Legacy`] (version 0, default): AES/ECB/PKCS#7, no IV,
//!   output is unpadded standard base64.
//! - [`CipherFormat::AesGcm`] (version 1, opt-in): see [`super::aes_gcm`],
//!   output is unpadded standard base64 of `nonce || ciphertext+tag`.
//!
//! ## Security Considerations
//!
//! - **The legacy format is weak.** ECB has no IV: equal plaintext blocks
//!   under the same key give equal ciphertext blocks, and nothing
//!   authenticates the payload. It stays the default only so existing peers
//!   keep interoperating. Moving off it means switching both peers to a
//!   newer `CipherFormat`.
//! - **[`SymmetricCipher::decrypt`] fails open.** On any failure it logs and
//!   hands back the ciphertext it was given, so a caller cannot tell a
//!   failed decrypt from plaintext by the return value alone. Callers that
//!   need to know must use [`SymmetricCipher::try_decrypt`] or validate the
//!   plaintext themselves.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use aes::{Aes128, Aes192, Aes256};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use ecb::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use serde::{Deserialize, Serialize};

use super::aes_gcm::{decrypt_aes_gcm, encrypt_aes_gcm};
use super::error::{CipherErrorKind, CryptoError, CryptoResult};
use crate::logging::{LogLevel, LogSink};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

const PAYLOAD_TEXT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Versioned payload format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum CipherFormat {
    /// Version 0: AES/ECB/PKCS#7
    #[default]
    Legacy,
    /// Version 1: AES-GCM with a random 12-byte nonce
    AesGcm,
}

impl CipherFormat {
    pub fn version(self) -> u8 {
        match self {
            CipherFormat::Legacy => 0,
            CipherFormat::AesGcm => 1,
        }
    }
}

impl fmt::Display for CipherFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherFormat::Legacy => write!(f, "legacy"),
            CipherFormat::AesGcm => write!(f, "aes-gcm"),
        }
    }
}

impl FromStr for CipherFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "ecb" | "v0" | "0" => Ok(CipherFormat::Legacy),
            "aes-gcm" | "gcm" | "v1" | "1" => Ok(CipherFormat::AesGcm),
            other => Err(format!("unknown cipher format: {:?}", other)),
        }
    }
}

fn invalid_key_size(kind: CipherErrorKind, len: usize) -> CryptoError {
    CryptoError::cipher(
        kind,
        format!("invalid AES key size: expected 16, 24 or 32 bytes, got {}", len),
    )
}

/// AES/ECB/PKCS#7 encryption, raw bytes out
pub fn encrypt_legacy(key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let bad_key = |_| invalid_key_size(CipherErrorKind::Encrypt, key.len());
    let ciphertext = match key.len() {
        16 => ecb::Encryptor::<Aes128>::new_from_slice(key)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => ecb::Encryptor::<Aes192>::new_from_slice(key)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => ecb::Encryptor::<Aes256>::new_from_slice(key)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        n => return Err(invalid_key_size(CipherErrorKind::Encrypt, n)),
    };
    Ok(ciphertext)
}

/// AES/ECB/PKCS#7 decryption of raw bytes
///
/// A padding failure is reported as `WrongKey`.
pub fn decrypt_legacy(key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::cipher(
            CipherErrorKind::Decrypt,
            format!(
                "illegal block size: {} bytes is not a positive multiple of {}",
                ciphertext.len(),
                BLOCK_SIZE
            ),
        ));
    }

    let bad_key = |_| invalid_key_size(CipherErrorKind::Decrypt, key.len());
    let plaintext = match key.len() {
        16 => ecb::Decryptor::<Aes128>::new_from_slice(key)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => ecb::Decryptor::<Aes192>::new_from_slice(key)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => ecb::Decryptor::<Aes256>::new_from_slice(key)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        n => return Err(invalid_key_size(CipherErrorKind::Decrypt, n)),
    };

    plaintext.map_err(|_| {
        CryptoError::cipher(
            CipherErrorKind::WrongKey,
            "padding check failed after decryption",
        )
    })
}

/// Stateless cipher over an explicit key
///
/// Holds only its format and log sink; safe to share between threads.
#[derive(Clone)]
pub struct SymmetricCipher {
    format: CipherFormat,
    sink: Arc<dyn LogSink>,
}

impl SymmetricCipher {
    pub fn new(format: CipherFormat, sink: Arc<dyn LogSink>) -> Self {
        Self { format, sink }
    }

    /// Cipher using the legacy (version 0) format
    pub fn legacy(sink: Arc<dyn LogSink>) -> Self {
        Self::new(CipherFormat::Legacy, sink)
    }

    pub fn format(&self) -> CipherFormat {
        self.format
    }

    /// Encrypt and return the base64 text as bytes
    pub fn try_encrypt(&self, key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let raw = match self.format {
            CipherFormat::Legacy => encrypt_legacy(key, plaintext)?,
            CipherFormat::AesGcm => encrypt_aes_gcm(plaintext, key)?,
        };
        Ok(PAYLOAD_TEXT.encode(raw).into_bytes())
    }

    /// Decrypt base64 text produced by [`SymmetricCipher::try_encrypt`]
    pub fn try_decrypt(&self, key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let raw = PAYLOAD_TEXT.decode(ciphertext).map_err(|e| {
            CryptoError::cipher(
                CipherErrorKind::Decrypt,
                format!("malformed base64 payload: {}", e),
            )
        })?;
        match self.format {
            CipherFormat::Legacy => decrypt_legacy(key, &raw),
            CipherFormat::AesGcm => decrypt_aes_gcm(&raw, key),
        }
    }

    /// Encrypt, or log and return `plaintext` unchanged on failure
    pub fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Vec<u8> {
        match self.try_encrypt(key, plaintext) {
            Ok(ciphertext) => ciphertext,
            Err(e) => {
                self.log_failure(&e);
                plaintext.to_vec()
            }
        }
    }

    /// Decrypt, or log and return `ciphertext` unchanged on failure
    ///
    /// **Fails open**: see the module docs. The return value alone does not
    /// say whether decryption succeeded.
    pub fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Vec<u8> {
        match self.try_decrypt(key, ciphertext) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                self.log_failure(&e);
                ciphertext.to_vec()
            }
        }
    }

    pub(crate) fn log_failure(&self, err: &CryptoError) {
        let (level, message) = match err.cipher_kind() {
            Some(CipherErrorKind::WrongKey) => (LogLevel::Error, "Error decrypting - wrong key"),
            Some(CipherErrorKind::Decrypt) => (LogLevel::Error, "Error decrypting"),
            Some(CipherErrorKind::Encrypt) => (LogLevel::Warn, "Error encrypting! Invalid key"),
            None => (LogLevel::Error, "Cipher failure"),
        };
        self.sink.log_error(level, message, err);
    }
}

impl fmt::Debug for SymmetricCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricCipher")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
