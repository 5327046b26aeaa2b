//! Structured sync log entries.
//!
//! The sync log is the externally observable trace of the fetch protocol's
//! progress: every attempt, retry, refresh, and terminal outcome is mirrored
//! here. Entries are append-only and listed newest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::id::ShopId;

/// Severity of a sync log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Stable lowercase string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown log level string.
#[derive(Debug, Error)]
#[error("unknown log level: {0}")]
pub struct LogLevelParseError(String);

impl std::str::FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LogLevelParseError(other.to_string())),
        }
    }
}

/// One append-only structured log entry, keyed by shop and adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    /// Entry identity.
    pub id: Uuid,
    /// Shop the entry belongs to.
    pub shop_id: ShopId,
    /// Adapter (platform) name that produced the entry.
    pub adapter: String,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Structured metadata (attempt number, response text, counts, ...).
    pub metadata: serde_json::Value,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

impl SyncLogEntry {
    /// Build an entry stamped with the current time.
    #[must_use]
    pub fn new(
        shop_id: ShopId,
        adapter: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            shop_id,
            adapter: adapter.into(),
            level,
            message: message.into(),
            metadata,
            created_at: Utc::now(),
        }
    }
}
