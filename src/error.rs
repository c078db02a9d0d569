//! Error types.
//!
//! Invalid user input never shows up here: blank text and unknown ids are
//! absorbed by the operations themselves. These errors cover the storage
//! backend and the command surface only.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Failure of a store read or write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The persisted value is not a todo list. Nothing is overwritten.
    #[error("stored value for key '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialise todos: {0}")]
    Serialise(#[source] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by the CLI and TUI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Input(String),
}

pub type AppResult<T> = Result<T, AppError>;
