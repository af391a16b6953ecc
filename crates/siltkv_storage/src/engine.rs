//! Engine adapter traits.

use crate::batch::WriteBatch;
use crate::error::StorageResult;

/// An ordered byte store with point-in-time snapshots and atomic batches.
///
/// Engines are **opaque byte stores**: they order keys by unsigned byte
/// comparison and never interpret keys or values.
///
/// # Invariants
///
/// - `commit` applies every operation of a batch or none of them
/// - A snapshot never observes batches committed after it was taken
/// - Stored values are never empty; a put with an empty value is rejected
/// - Every operation after `close` fails with [`crate::StorageError::Closed`]
///
/// # Implementors
///
/// - [`crate::InMemoryEngine`] - For testing
/// - [`crate::FileEngine`] - For persistent storage
pub trait StorageEngine: Send + Sync {
    /// Reads the latest committed value of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Pins the current committed state.
    ///
    /// The snapshot is released when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed.
    fn snapshot(&self) -> StorageResult<Box<dyn Snapshot>>;

    /// Creates an empty batch for this engine.
    fn new_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Applies `batch` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch holds an empty value, the engine is
    /// closed, or the write cannot be made durable. Nothing is applied on
    /// error.
    fn commit(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Closes the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if pending data cannot be flushed.
    fn close(&self) -> StorageResult<()>;

    /// Reclaims space held by superseded data. No-op by default.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or rewriting fails.
    fn compact(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// An immutable, point-in-time view of an engine.
pub trait Snapshot: Send + Sync {
    /// The commit sequence this snapshot observes.
    fn sequence(&self) -> u64;

    /// Reads `key` as of this snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Returns an iterator positioned at the first key `>= start`.
    ///
    /// The iterator keeps the snapshot pinned until it is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed.
    fn iter(&self, start: &[u8]) -> StorageResult<Box<dyn EngineIterator + Send>>;
}

/// A positioned cursor over ascending key/value pairs.
///
/// A freshly created iterator is already positioned; check [`valid`] before
/// reading. `key` and `value` return empty slices once the iterator is
/// exhausted.
///
/// [`valid`]: EngineIterator::valid
pub trait EngineIterator {
    /// Returns true while the cursor points at an entry.
    fn valid(&self) -> bool;

    /// Key of the current entry.
    fn key(&self) -> &[u8];

    /// Value of the current entry.
    fn value(&self) -> &[u8];

    /// Advances to the next entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying engine fails.
    fn next(&mut self) -> StorageResult<()>;
}

impl<I: EngineIterator + ?Sized> EngineIterator for Box<I> {
    fn valid(&self) -> bool {
        (**self).valid()
    }

    fn key(&self) -> &[u8] {
        (**self).key()
    }

    fn value(&self) -> &[u8] {
        (**self).value()
    }

    fn next(&mut self) -> StorageResult<()> {
        (**self).next()
    }
}
