// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Endpoint Record Codec
//!
//! Converts an [`EncryptionEndpoint`] to and from the flat record used for
//! disk persistence.
//!
//! ## Format
//! ```json
//! {
//!   "public": "<base64 SPKI DER>",
//!   "private": "<base64 PKCS#8 DER>",
//!   "shared": "<base64 secret>" | "null"
//! }
//! ```
//!
//! `"null"` is a literal string meaning "no secret derived yet". A record
//! without a `shared` field is malformed. The `active` flag is not
//! persisted; loaded endpoints start active.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::codec;
use super::endpoint::{EncryptionEndpoint, EndpointFactory};
use super::error::{CryptoError, CryptoResult};

/// Sentinel stored in `shared` when no secret exists
pub const NULL_SENTINEL: &str = "null";

/// Persisted form of an endpoint
///
/// Fields are optional so that a missing field can be told apart from a
/// malformed one when the record is loaded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEndpointRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<String>,
}

impl PersistedEndpointRecord {
    /// True if the record carries a derived secret
    pub fn has_shared_secret(&self) -> bool {
        matches!(self.shared.as_deref(), Some(s) if s != NULL_SENTINEL)
    }
}

impl fmt::Debug for PersistedEndpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedEndpointRecord")
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| "[REDACTED]"))
            .field(
                "shared",
                &self.shared.as_deref().map(|s| {
                    if s == NULL_SENTINEL {
                        NULL_SENTINEL
                    } else {
                        "[REDACTED]"
                    }
                }),
            )
            .finish()
    }
}

/// Encode an endpoint's keys and secret
///
/// # Errors
///
/// `InvalidEncryption` if the endpoint has no key pair (key generation failed).
pub fn serialize_endpoint(endpoint: &EncryptionEndpoint) -> CryptoResult<PersistedEndpointRecord> {
    let (Some(public_key), Some(private_key)) = (endpoint.public_key(), endpoint.private_key())
    else {
        return Err(CryptoError::InvalidEncryption(
            "endpoint has no key pair to serialize".to_string(),
        ));
    };

    let public_der = codec::public_key_der(public_key)?;
    let private_der = codec::private_key_der(private_key)?;
    let shared = match endpoint.shared_secret() {
        Some(secret) => codec::encode_key(secret.as_bytes()),
        None => NULL_SENTINEL.to_string(),
    };

    Ok(PersistedEndpointRecord {
        public: Some(codec::encode_key(&public_der)),
        private: Some(codec::encode_key(&private_der)),
        shared: Some(shared),
    })
}

/// Rebuild an endpoint from its record, using `factory`'s cipher and sink
///
/// # Errors
///
/// `InvalidEncryption` if `public` or `private` is missing or does not
/// decode, if `shared` is missing, or if the stored secret is not base64.
pub fn deserialize_endpoint(
    record: &PersistedEndpointRecord,
    factory: &EndpointFactory,
) -> CryptoResult<EncryptionEndpoint> {
    let decode_field = |field: &Option<String>| -> CryptoResult<Option<Vec<u8>>> {
        field
            .as_deref()
            .map(|text| {
                codec::decode_key(text).map_err(|e| {
                    CryptoError::InvalidEncryption(format!(
                        "The public or private key is invalid: {}",
                        e
                    ))
                })
            })
            .transpose()
    };

    let public = decode_field(&record.public)?;
    let private = decode_field(&record.private)?;

    let shared = match record.shared.as_deref() {
        None => {
            return Err(CryptoError::InvalidEncryption(
                "The record has no shared field".to_string(),
            ))
        }
        Some(NULL_SENTINEL) => None,
        Some(text) => Some(codec::decode_key(text).map_err(|e| {
            CryptoError::InvalidEncryption(format!("The shared secret is invalid: {}", e))
        })?),
    };

    factory.load(public.as_deref(), private.as_deref(), shared.as_deref())
}
