// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Logging Sink
//!
//! The endpoint, cipher and codec never log through a global. They hold an
//! `Arc<dyn LogSink>` handed in by the caller.
//!
//! - [`TracingSink`] forwards to `tracing` (the default)
//! - [`MemorySink`] keeps every entry in memory, for tests and for embedders
//!   that want to inspect cipher failures
//!
//! A sink must never panic and returns nothing.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Log level accepted by a [`LogSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Destination for leveled log messages
pub trait LogSink: Send + Sync {
    /// Log a message
    fn log(&self, level: LogLevel, message: &str);

    /// Log a message together with the error that caused it
    fn log_error(&self, level: LogLevel, message: &str, cause: &(dyn Error + 'static));
}

/// Forwards to `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    /// Shared handle, ready to pass to constructors
    pub fn shared() -> Arc<dyn LogSink> {
        Arc::new(TracingSink)
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", message),
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
    }

    fn log_error(&self, level: LogLevel, message: &str, cause: &(dyn Error + 'static)) {
        match level {
            LogLevel::Trace => tracing::trace!(error = %cause, "{}", message),
            LogLevel::Debug => tracing::debug!(error = %cause, "{}", message),
            LogLevel::Info => tracing::info!(error = %cause, "{}", message),
            LogLevel::Warn => tracing::warn!(error = %cause, "{}", message),
            LogLevel::Error => tracing::error!(error = %cause, "{}", message),
        }
    }
}

/// One entry captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    /// Display form of the cause, if one was given
    pub cause: Option<String>,
}

impl LogRecord {
    /// True if the message or the cause contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.message.contains(needle)
            || self.cause.as_deref().is_some_and(|c| c.contains(needle))
    }
}

/// Keeps log entries in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// True if any entry at `level` mentions `needle`
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|r| r.level == level && r.mentions(needle))
    }

    /// Number of entries logged so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, record: LogRecord) {
        self.lock().push(record);
    }

    // A panic while holding the lock must not turn into a panic inside a sink
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str) {
        self.push(LogRecord {
            level,
            message: message.to_string(),
            cause: None,
        });
    }

    fn log_error(&self, level: LogLevel, message: &str, cause: &(dyn Error + 'static)) {
        self.push(LogRecord {
            level,
            message: message.to_string(),
            cause: Some(cause.to_string()),
        });
    }
}
