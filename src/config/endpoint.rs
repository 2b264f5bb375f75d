// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Endpoint Configuration Module
//!
//! Provides endpoint configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::crypto::{CipherFormat, KeySize};

pub const DEFAULT_STORE_DIR: &str = "./config/endpoints";
pub const DEFAULT_ENDPOINT_NAME: &str = "default";

/// Endpoint Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Curve strength for newly generated endpoints
    pub key_size: KeySize,

    /// Payload format used by the cipher
    pub cipher_format: CipherFormat,

    /// Directory holding persisted endpoint records
    pub store_dir: PathBuf,

    /// Record name used when none is given explicitly
    pub endpoint_name: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            key_size: KeySize::Size256,
            cipher_format: CipherFormat::Legacy,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            endpoint_name: DEFAULT_ENDPOINT_NAME.to_string(),
        }
    }
}

impl EndpointConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `ENDPOINT_KEY_SIZE`: 128, 192, 256 or 512 (default: 256)
    /// - `ENDPOINT_CIPHER_FORMAT`: legacy or aes-gcm (default: legacy)
    /// - `ENDPOINT_STORE_DIR`: Directory for endpoint records
    /// - `ENDPOINT_NAME`: Default record name
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            key_size: env::var("ENDPOINT_KEY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.key_size),
            cipher_format: env::var("ENDPOINT_CIPHER_FORMAT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cipher_format),
            store_dir: env::var("ENDPOINT_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            endpoint_name: env::var("ENDPOINT_NAME").unwrap_or(defaults.endpoint_name),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.key_size.curve().is_none() {
            return Err(format!(
                "key_size {} has no available curve (use 128 or 256)",
                self.key_size
            ));
        }

        if self.store_dir.as_os_str().is_empty() {
            return Err("store_dir must not be empty".to_string());
        }

        if !is_valid_name(&self.endpoint_name) {
            return Err(format!(
                "endpoint_name {:?} must be non-empty and use only ASCII letters, digits, '-' or '_'",
                self.endpoint_name
            ));
        }

        Ok(())
    }
}

/// Serializes tests that read or mutate the process environment
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Record names double as file names
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
