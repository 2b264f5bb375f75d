// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod crypto;
pub mod logging;
pub mod storage;

// Re-export main types
pub use config::EndpointConfig;
pub use crypto::{
    CipherErrorKind, CipherFormat, CryptoError, CryptoResult, Encryption, EncryptionEndpoint,
    EndpointFactory, FixedKeyEncryption, KeyCodec, KeySize, PersistedEndpointRecord,
    SymmetricCipher,
};
pub use logging::{LogLevel, LogSink, MemorySink, TracingSink};
pub use storage::{EndpointStore, StoreError};
