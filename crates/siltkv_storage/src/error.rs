//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk log is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The engine has been closed.
    #[error("storage is closed")]
    Closed,

    /// Another process holds the engine directory.
    #[error("storage directory is locked by another process: {}", path.display())]
    Locked {
        /// The locked directory.
        path: PathBuf,
    },

    /// The engine directory does not exist and creation was not requested.
    #[error("storage directory does not exist: {}", path.display())]
    NotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// The engine directory already holds data and that was not allowed.
    #[error("storage already exists: {}", path.display())]
    AlreadyExists {
        /// The existing directory.
        path: PathBuf,
    },

    /// A failed commit could not be cut back out of the log.
    ///
    /// The engine refuses further commits until it is compacted or reopened.
    #[error("log writer failed; compact or reopen the engine")]
    WriterFailed,

    /// A batch tried to store a zero-length value.
    ///
    /// Zero-length values are reserved as deletion markers above the engine.
    #[error("empty value for key of {key_len} bytes")]
    EmptyValue {
        /// Length of the offending key.
        key_len: usize,
    },

    /// A key, value or batch does not fit the log's 32-bit length fields.
    #[error("log record too large: {len} bytes")]
    RecordTooLarge {
        /// The size that overflowed.
        len: usize,
    },
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
