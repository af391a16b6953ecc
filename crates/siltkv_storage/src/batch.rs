//! Atomic write batches.

use crate::error::{StorageError, StorageResult};

/// One staged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or overwrite `key`.
    Put {
        /// Target key.
        key: Vec<u8>,
        /// New value, never empty.
        value: Vec<u8>,
    },
    /// Remove `key` if present.
    Delete {
        /// Target key.
        key: Vec<u8>,
    },
}

impl BatchOp {
    /// Returns the key this operation touches.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// A set of mutations applied all-or-nothing by
/// [`crate::StorageEngine::commit`].
///
/// Operations apply in insertion order, so a later operation on the same
/// key wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a put.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Stages a delete.
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    /// Returns the number of staged operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterates staged operations in order.
    pub fn iter(&self) -> impl Iterator<Item = &BatchOp> {
        self.ops.iter()
    }

    /// Drops all staged operations.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Rejects batches that would store a zero-length value.
    pub(crate) fn validate(&self) -> StorageResult<()> {
        for op in &self.ops {
            if let BatchOp::Put { key, value } = op {
                if value.is_empty() {
                    return Err(StorageError::EmptyValue { key_len: key.len() });
                }
            }
        }
        Ok(())
    }
}
