//! In-memory storage engine for testing.

use crate::batch::WriteBatch;
use crate::engine::{Snapshot, StorageEngine};
use crate::error::StorageResult;
use crate::mvcc::VersionedTable;
use std::sync::Arc;

/// An in-memory storage engine.
///
/// This engine keeps all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This engine is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use siltkv_storage::{InMemoryEngine, StorageEngine, WriteBatch};
///
/// let engine = InMemoryEngine::new();
/// let mut batch = WriteBatch::new();
/// batch.put(b"k".to_vec(), b"v".to_vec());
/// engine.commit(batch).unwrap();
/// assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    table: Arc<VersionedTable>,
}

impl InMemoryEngine {
    /// Creates a new empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine pre-loaded with `entries`.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is empty.
    pub fn with_entries<I, K, V>(entries: I) -> StorageResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        let engine = Self::new();
        let mut batch = WriteBatch::new();
        for (k, v) in entries {
            batch.put(k, v);
        }
        engine.commit(batch)?;
        Ok(engine)
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.live_len()
    }

    /// Returns true if no key holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of stored versions, including ones only
    /// reachable from open snapshots.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.table.version_count()
    }

    /// Returns the number of snapshots (and their iterators) still open.
    #[must_use]
    pub fn open_snapshots(&self) -> usize {
        self.table.pinned_count()
    }
}

impl StorageEngine for InMemoryEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.table.get_latest(key)
    }

    fn snapshot(&self) -> StorageResult<Box<dyn Snapshot>> {
        Ok(Box::new(self.table.pin()?))
    }

    fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        batch.validate()?;
        self.table.apply(&batch)?;
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        self.table.close();
        Ok(())
    }

    fn compact(&self) -> StorageResult<()> {
        self.table.ensure_open()?;
        self.table.collect_garbage();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    #[test]
    fn commit_and_get() {
        let engine = InMemoryEngine::new();
        let mut batch = engine.new_batch();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.put(b"b".to_vec(), b"2".to_vec());
        engine.commit(batch).unwrap();

        assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"c").unwrap(), None);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn empty_value_rejects_whole_batch() {
        let engine = InMemoryEngine::new();
        let mut batch = WriteBatch::new();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.put(b"b".to_vec(), Vec::new());
        assert!(matches!(
            engine.commit(batch),
            Err(StorageError::EmptyValue { .. })
        ));
        assert!(engine.is_empty());
    }

    #[test]
    fn snapshot_iterates_in_order() {
        let engine = InMemoryEngine::with_entries([
            (b"c".to_vec(), b"3".to_vec()),
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
        ])
        .unwrap();
        let snap = engine.snapshot().unwrap();

        let mut batch = WriteBatch::new();
        batch.delete(b"b".to_vec());
        engine.commit(batch).unwrap();

        let mut it = snap.iter(b"").unwrap();
        let mut keys = Vec::new();
        while it.valid() {
            keys.push(it.key().to_vec());
            it.next().unwrap();
        }
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(engine.get(b"b").unwrap(), None);
    }

    #[test]
    fn snapshots_release_on_drop() {
        let engine = InMemoryEngine::new();
        let snap = engine.snapshot().unwrap();
        let it = snap.iter(b"").unwrap();
        assert_eq!(engine.open_snapshots(), 1);
        drop(snap);
        drop(it);
        assert_eq!(engine.open_snapshots(), 0);
    }

    #[test]
    fn compact_drops_unreachable_versions() {
        let engine = InMemoryEngine::with_entries([(b"k".to_vec(), b"1".to_vec())]).unwrap();
        let snap = engine.snapshot().unwrap();
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"2".to_vec());
        engine.commit(batch).unwrap();
        assert_eq!(engine.version_count(), 2);

        drop(snap);
        engine.compact().unwrap();
        assert_eq!(engine.version_count(), 1);
    }

    #[test]
    fn operations_fail_after_close() {
        let engine = InMemoryEngine::new();
        engine.close().unwrap();
        assert!(matches!(engine.get(b"a"), Err(StorageError::Closed)));
        assert!(matches!(engine.snapshot(), Err(StorageError::Closed)));
        assert!(matches!(
            engine.commit(WriteBatch::new()),
            Err(StorageError::Closed)
        ));
        assert!(matches!(engine.compact(), Err(StorageError::Closed)));
    }
}
