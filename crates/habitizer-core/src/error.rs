//! Core error types for habitizer-core.
//!
//! This module defines the error hierarchy using thiserror. Engine errors
//! are local, non-fatal rejections of a single command; storage and config
//! errors wrap the underlying I/O failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::routine::{RoutineId, RoutineState, TaskId};

/// Core error type for habitizer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A command was rejected by the execution engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Repository-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// The engine rejection behind this error, if any.
    pub fn as_engine(&self) -> Option<&EngineError> {
        match self {
            CoreError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

/// Rejections raised by routine commands. None of these leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Command issued outside its legal state
    #[error("cannot {command} routine {routine_id} while it is {state}")]
    InvalidTransition {
        routine_id: RoutineId,
        command: &'static str,
        state: RoutineState,
    },

    /// Only one routine may be in progress or paused at a time
    #[error("cannot start routine {routine_id}: routine {active_id} is already running")]
    RoutineAlreadyActive {
        routine_id: RoutineId,
        active_id: RoutineId,
    },

    /// Check-off target lies behind the cursor
    #[error("task {task_id} of routine {routine_id} precedes the current task (index {cursor})")]
    OutOfOrderCheckoff {
        routine_id: RoutineId,
        task_id: TaskId,
        cursor: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },

    /// Unknown routine or task id
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
}

impl EngineError {
    pub fn routine_not_found(id: RoutineId) -> Self {
        EngineError::NotFound { kind: "routine", id }
    }

    pub fn task_not_found(id: TaskId) -> Self {
        EngineError::NotFound { kind: "task", id }
    }
}

/// Repository-specific errors.
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

    /// Stored row could not be turned back into a routine
    #[error("Corrupt record for routine {routine_id}: {message}")]
    Corrupt {
        routine_id: RoutineId,
        message: String,
    },

    /// Data directory could not be resolved or created
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

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
