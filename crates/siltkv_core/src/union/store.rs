//! Transaction-local write overlay over a snapshot.

use crate::error::{CoreError, CoreResult};
use crate::union::iter::{BoundedIter, DirtyIter, UnionIter};
use siltkv_storage::{EngineIterator, Snapshot};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

/// Iterator returned by [`UnionStore::seek`].
pub type UnionStoreIter<'a> = UnionIter<DirtyIter<'a>, Box<dyn EngineIterator + Send>>;

/// Read-your-writes layer over an immutable snapshot.
///
/// Pending writes live in a sorted in-memory map. An empty pending value is a
/// tombstone: the key reads as absent no matter what the snapshot holds.
pub struct UnionStore {
    dirty: BTreeMap<Vec<u8>, Vec<u8>>,
    snapshot: Option<Box<dyn Snapshot>>,
}

impl fmt::Debug for UnionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionStore")
            .field("dirty_len", &self.dirty.len())
            .field("sequence", &self.snapshot.as_ref().map(|s| s.sequence()))
            .finish()
    }
}

impl UnionStore {
    /// Creates an empty overlay over `snapshot`.
    #[must_use]
    pub fn new(snapshot: Box<dyn Snapshot>) -> Self {
        Self {
            dirty: BTreeMap::new(),
            snapshot: Some(snapshot),
        }
    }

    fn snapshot(&self) -> CoreResult<&dyn Snapshot> {
        self.snapshot
            .as_deref()
            .ok_or_else(|| CoreError::invalid_operation("union store is closed"))
    }

    /// Reads `key`, preferring pending writes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotExist`] if the key is absent or tombstoned.
    pub fn get(&self, key: &[u8]) -> CoreResult<Vec<u8>> {
        let snapshot = self.snapshot()?;
        if let Some(value) = self.dirty.get(key) {
            if value.is_empty() {
                return Err(CoreError::NotExist);
            }
            return Ok(value.clone());
        }
        match snapshot.get(key)? {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(CoreError::NotExist),
        }
    }

    /// Reads `key` from the snapshot only, ignoring pending writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the engine fails.
    pub fn snapshot_get(&self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.snapshot()?.get(key)?)
    }

    /// Stages a write.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CannotSetNilValue`] for an empty value.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        if value.is_empty() {
            return Err(CoreError::CannotSetNilValue);
        }
        self.snapshot()?;
        self.dirty.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    /// Stages a tombstone, whether or not the key exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        self.snapshot()?;
        self.dirty.insert(key.to_vec(), Vec::new());
        Ok(())
    }

    /// Returns a merged iterator positioned at the first key `>= key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the engine fails.
    pub fn seek(&self, key: &[u8]) -> CoreResult<UnionStoreIter<'_>> {
        let snapshot_iter = self.snapshot()?.iter(key)?;
        let dirty_iter = DirtyIter::new(
            self.dirty
                .range::<[u8], _>((Bound::Included(key), Bound::Unbounded)),
        );
        Ok(UnionIter::new(dirty_iter, snapshot_iter)?)
    }

    /// Like [`seek`](Self::seek), but the iterator ends at the first key
    /// `stop` accepts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the engine fails.
    pub fn seek_until<F>(
        &self,
        key: &[u8],
        stop: F,
    ) -> CoreResult<BoundedIter<UnionStoreIter<'_>, F>>
    where
        F: Fn(&[u8]) -> bool,
    {
        Ok(BoundedIter::new(self.seek(key)?, stop))
    }

    /// Pending writes in key order; tombstones have empty values.
    pub fn dirty_entries(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.dirty
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Number of pending writes, tombstones included.
    #[must_use]
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Discards pending writes and releases the snapshot.
    pub fn close(&mut self) {
        self.dirty.clear();
        self.snapshot = None;
    }

    /// Returns true once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.snapshot.is_none()
    }
}
