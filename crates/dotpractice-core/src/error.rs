//! Core error types for dotpractice-core.
//!
//! Every concern gets its own `thiserror` enum; [`CoreError`] wraps them all
//! so callers that do not care about the distinction can use `?` freely.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::SessionStatus;

/// Core error type for dotpractice-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session clock transition errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Progress ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected session clock commands.
///
/// A rejected command never mutates the clock.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The command is not valid from the current state
    #[error("cannot {action} while session is {from}")]
    InvalidTransition {
        from: SessionStatus,
        action: &'static str,
    },
}

/// Progress ledger errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A manual adjustment would drive accumulated time below zero
    #[error("adjusting level {level_id} by {minutes} min would leave {current_secs}s below zero")]
    NegativeTime {
        level_id: u32,
        minutes: i64,
        current_secs: u64,
    },
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Rejected import payloads. The existing store is never touched.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Payload is not JSON at all
    #[error("payload is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    /// A required field is absent or has the wrong type
    #[error("payload is missing {0}")]
    MissingField(&'static str),

    /// Payload passed the minimal checks but does not describe a store
    #[error("payload does not describe a practice store: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No level with this id exists in the catalog
    #[error("unknown level: {0}")]
    UnknownLevel(u32),

    /// The level needs a focus image and none has been uploaded
    #[error("level {level_id} needs a focus image; upload a sigil first")]
    MissingFocusImage { level_id: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
