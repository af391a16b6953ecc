//! Error types for siltkv core.

use crate::types::TransactionId;
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Why a commit lost validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Another transaction holds the key's commit lock.
    Locked {
        /// The transaction holding the lock.
        owner: TransactionId,
    },
    /// The committed value differs from the one first observed.
    ValueChanged,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked { owner } => write!(f, "locked by {owner}"),
            Self::ValueChanged => write!(f, "value changed since first read"),
        }
    }
}

/// Errors that can occur in siltkv core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage engine error.
    #[error("storage error: {0}")]
    Storage(#[from] siltkv_storage::StorageError),

    /// Key codec error (covers both encode and decode failures).
    #[error("codec error: {0}")]
    Codec(#[from] siltkv_codec::CodecError),

    /// The key is absent or logically deleted.
    #[error("key not exist")]
    NotExist,

    /// The transaction has already committed or rolled back.
    #[error("invalid transaction")]
    InvalidTransaction,

    /// A set was attempted with an empty value.
    #[error("cannot set nil value")]
    CannotSetNilValue,

    /// Commit validation failed; retry from a fresh transaction.
    #[error("{txn_id} conflict on key {key:02x?}: {reason}")]
    Conflict {
        /// The transaction whose commit failed.
        txn_id: TransactionId,
        /// The encoded key that failed validation.
        key: Vec<u8>,
        /// What failed.
        reason: ConflictKind,
    },

    /// A counter held a value that is not a decimal integer.
    #[error("parse counter: {0}")]
    ParseInt(#[from] ParseIntError),

    /// An argument outside the accepted range.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a conflict error.
    pub fn conflict(txn_id: TransactionId, key: impl Into<Vec<u8>>, reason: ConflictKind) -> Self {
        Self::Conflict {
            txn_id,
            key: key.into(),
            reason,
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotExist`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotExist)
    }

    /// Returns true for [`CoreError::Conflict`].
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns true if retrying the whole transaction may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}
