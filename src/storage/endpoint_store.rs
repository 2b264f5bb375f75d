// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Endpoint Record Storage
//!
//! Persists endpoint records as pretty-printed JSON files, one per name:
//! `<dir>/<name>.json`. Names are restricted to ASCII alphanumerics, `-`
//! and `_` so that a name can never escape the store directory.
//!
//! Records contain private keys. Each record is written to a temporary file
//! in the store directory (mode 0600 on unix) and renamed over the target,
//! so readers never observe a partial record.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::is_valid_name;
use crate::crypto::{
    deserialize_endpoint, serialize_endpoint, CryptoError, EncryptionEndpoint, EndpointFactory,
    PersistedEndpointRecord,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed endpoint record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No endpoint record at {0}")]
    NotFound(PathBuf),

    #[error("Invalid endpoint name: {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Directory of endpoint records
#[derive(Debug, Clone)]
pub struct EndpointStore {
    dir: PathBuf,
}

impl EndpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a record name
    pub fn path_for(&self, name: &str) -> StoreResult<PathBuf> {
        if !is_valid_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }

    /// Write a record, replacing any existing one
    pub fn save(&self, name: &str, record: &PersistedEndpointRecord) -> StoreResult<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(record)?;
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;

        info!("💾 Saved endpoint record '{}' to {}", name, path.display());
        Ok(path)
    }

    /// Read a record
    pub fn load(&self, name: &str) -> StoreResult<PersistedEndpointRecord> {
        let path = self.path_for(name)?;
        if !path.exists() {
            warn!("❌ No endpoint record '{}' at {}", name, path.display());
            return Err(StoreError::NotFound(path));
        }

        debug!("🔍 Loading endpoint record '{}' from {}", name, path.display());
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.exists()).unwrap_or(false)
    }

    /// Delete a record; returns false if there was none
    pub fn remove(&self, name: &str) -> StoreResult<bool> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("🗑️ Removed endpoint record '{}'", name);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Serialize and save an endpoint
    pub fn save_endpoint(&self, name: &str, endpoint: &EncryptionEndpoint) -> StoreResult<PathBuf> {
        let record = serialize_endpoint(endpoint)?;
        self.save(name, &record)
    }

    /// Load and rebuild an endpoint with `factory`'s cipher and sink
    pub fn load_endpoint(
        &self,
        name: &str,
        factory: &EndpointFactory,
    ) -> StoreResult<EncryptionEndpoint> {
        let record = self.load(name)?;
        Ok(deserialize_endpoint(&record, factory)?)
    }
}
