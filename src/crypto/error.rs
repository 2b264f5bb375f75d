// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error taxonomy for the endpoint subsystem.
//!
//! ## Propagation
//!
//! - **KeyGeneration**, **KeyAgreement** and **Cipher** failures are logged
//!   where they happen and degrade gracefully (the endpoint stays unusable,
//!   or the cipher echoes its input).
//! - **KeyDecode** and **InvalidEncryption** are returned to the caller, since
//!   an endpoint cannot be built from broken key material.
//!
//! ## Usage Example
//!
//! ```rust
//! use fabstir_endpoint_crypto::crypto::{CipherErrorKind, CryptoError};
//!
//! let err = CryptoError::Cipher {
//!     kind: CipherErrorKind::WrongKey,
//!     reason: "padding check failed".to_string(),
//! };
//! assert!(err.to_string().contains("wrong key"));
//! ```

use std::fmt;
use thiserror::Error;

/// Which side of the cipher failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherErrorKind {
    /// Encryption failed (bad key length, unavailable algorithm)
    Encrypt,
    /// Decryption failed for a reason other than the key (bad encoding, bad block size)
    Decrypt,
    /// Decryption failed the padding or authentication check, which means the key is wrong
    WrongKey,
}

impl fmt::Display for CipherErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherErrorKind::Encrypt => write!(f, "encrypt"),
            CipherErrorKind::Decrypt => write!(f, "decrypt"),
            CipherErrorKind::WrongKey => write!(f, "wrong key"),
        }
    }
}

/// Error type for all endpoint, cipher and codec operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The requested curve or algorithm is not available
    #[error("Key generation failed for {key_size}: {reason}")]
    KeyGeneration {
        /// Requested key size, as displayed by `KeySize`
        key_size: String,
        /// Specific failure reason
        reason: String,
    },

    /// Peer key is invalid/incompatible, or the agreement handle is already spent
    #[error("Key agreement failed: {reason}")]
    KeyAgreement {
        /// Specific failure reason
        reason: String,
    },

    /// Symmetric cipher failure
    #[error("Cipher error ({kind}): {reason}")]
    Cipher {
        /// Which cipher operation failed
        kind: CipherErrorKind,
        /// Specific failure reason
        reason: String,
    },

    /// Encoded key material could not be reconstructed
    #[error("Failed to decode {key_type}: {reason}")]
    KeyDecode {
        /// Type of key (e.g. "public_key", "private_key", "shared_secret")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Persisted endpoint material is missing or invalid
    #[error("Invalid encryption endpoint: {0}")]
    InvalidEncryption(String),
}

impl CryptoError {
    pub(crate) fn cipher(kind: CipherErrorKind, reason: impl Into<String>) -> Self {
        CryptoError::Cipher {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn key_decode(key_type: &str, reason: impl fmt::Display) -> Self {
        CryptoError::KeyDecode {
            key_type: key_type.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Cipher error kind, if this is a cipher error
    pub fn cipher_kind(&self) -> Option<CipherErrorKind> {
        match self {
            CryptoError::Cipher { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

// Conversion from base64 decode errors
impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::key_decode("base64_text", format!("base64 decode error: {}", err))
    }
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;
