//! Core error types for calsync-core.
//!
//! Adapter errors (`StoreError`, `SourceError`) are what the collaborators
//! report; `PassError` is what a reconciliation pass fails with. None of
//! these reach callers of the sync setters: the engine handles them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for calsync-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Event store errors
    #[error("Event store error: {0}")]
    Store(#[from] StoreError),

    /// Task source errors
    #[error("Task source error: {0}")]
    Source(#[from] SourceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by an event store adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store refused the operation for lack of write authorization.
    #[error("Calendar access denied")]
    PermissionDenied,

    /// Any other query/insert/delete fault.
    #[error("Calendar store unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by a task source adapter.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read task list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Task list unavailable: {0}")]
    Unavailable(String),
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

    /// No usable configuration directory
    #[error("Configuration directory unavailable: {0}")]
    NoDataDir(String),
}

/// Reasons a reconciliation pass aborts.
#[derive(Error, Debug)]
pub enum PassError {
    /// Write authorization missing while mirroring is enabled.
    #[error("No write access to the reminder calendar")]
    PermissionDenied,

    /// The store accepted the create call but the container did not appear.
    #[error("Reminder calendar '{name}' could not be created")]
    ContainerNotCreated { name: String },

    /// Creating or re-querying a missing container failed.
    #[error("Reminder calendar '{name}' could not be created: {reason}")]
    CreateFailed { name: String, reason: StoreError },

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl From<StoreError> for PassError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PermissionDenied => PassError::PermissionDenied,
            other => PassError::Store(other),
        }
    }
}

impl PassError {
    /// Whether this failure turns mirroring off until the user re-enables it.
    pub fn disables_sync(&self) -> bool {
        matches!(
            self,
            PassError::PermissionDenied
                | PassError::ContainerNotCreated { .. }
                | PassError::CreateFailed { .. }
        )
    }

    /// Whether the user is told about this failure.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, PassError::Source(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
