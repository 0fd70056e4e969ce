//! Core error types for nudgewatch-core.
//!
//! This module defines the error hierarchy using thiserror. Collaborator
//! errors (`SourceError`, `DecisionError`, `NotifyError`) are what the
//! external fetchers, reasoning client and notifier hand back to the
//! orchestrator; everything else surfaces through `CoreError`.

use std::path::PathBuf;
use thiserror::Error;

use crate::sources::SourceKind;

/// Core error type for nudgewatch-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Primary notification delivery failed
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// The connection mutex was poisoned by a panicking holder
    #[error("Database connection poisoned")]
    Poisoned,
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home or data directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Wall-clock value not in HH:MM form
    #[error("Invalid time of day '{0}': expected HH:MM")]
    InvalidTimeOfDay(String),

    /// Unknown source kind
    #[error("Unknown source kind '{0}': expected email, task or calendar")]
    UnknownSourceKind(String),

    /// Button callback identifier that maps to no action
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    /// Action that needs a target id was given none
    #[error("Action '{verb}' requires an id")]
    MissingActionTarget { verb: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failure reported by a data-source collector.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("{source_kind} fetch timed out after {timeout_secs}s")]
    Timeout {
        source_kind: SourceKind,
        timeout_secs: u64,
    },

    #[error("{source_kind} is not authenticated")]
    NotAuthenticated { source_kind: SourceKind },

    #[error("{source_kind} fetch failed: {message}")]
    Failed {
        source_kind: SourceKind,
        message: String,
    },
}

impl SourceError {
    pub fn failed(source_kind: SourceKind, message: impl Into<String>) -> Self {
        SourceError::Failed {
            source_kind,
            message: message.into(),
        }
    }
}

/// Failure of the reasoning call itself.
#[derive(Error, Debug, Clone)]
pub enum DecisionError {
    #[error("decision request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("decision transport failed: {0}")]
    Transport(String),

    #[error("malformed decision output: {0}")]
    Malformed(String),

    #[error("decision output missing field '{0}'")]
    MissingField(&'static str),
}

/// Failure delivering to the user channel.
#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    #[error("notification channel unavailable: {0}")]
    Unavailable(String),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
