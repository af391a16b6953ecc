//! Merged iteration over a dirty overlay and a snapshot.

use siltkv_storage::{EngineIterator, StorageResult};
use std::cmp::Ordering;
use std::collections::btree_map;
use tracing::warn;

/// Which source the union iterator is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    Dirty,
    Snapshot,
    /// Dirty entry shadowing a snapshot entry with the same key.
    Both,
}

/// One ascending view over a dirty overlay and a snapshot.
///
/// Dirty entries win over snapshot entries with the same key, and an empty
/// dirty value is a tombstone that hides the key from the view entirely.
/// Every positioning step advances at least one source, so iteration always
/// terminates.
#[derive(Debug)]
pub struct UnionIter<D, S> {
    dirty: Option<D>,
    snapshot: Option<S>,
    current: Option<Current>,
    orphan_tombstones: usize,
}

impl<D: EngineIterator, S: EngineIterator> UnionIter<D, S> {
    /// Builds the view from two already positioned iterators.
    ///
    /// # Errors
    ///
    /// Returns an error if advancing past a tombstone fails.
    pub fn new(dirty: D, snapshot: S) -> StorageResult<Self> {
        let mut iter = Self {
            dirty: Some(dirty),
            snapshot: Some(snapshot),
            current: None,
            orphan_tombstones: 0,
        };
        iter.position()?;
        Ok(iter)
    }

    /// Number of dirty tombstones skipped that had no snapshot entry to hide.
    #[must_use]
    pub fn orphan_tombstones(&self) -> usize {
        self.orphan_tombstones
    }

    /// Releases both sources. Safe to call more than once.
    pub fn close(&mut self) {
        self.dirty = None;
        self.snapshot = None;
        self.current = None;
    }

    fn position(&mut self) -> StorageResult<()> {
        loop {
            let dirty = self.dirty.as_mut().filter(|d| d.valid());
            let snapshot = self.snapshot.as_mut().filter(|s| s.valid());

            let (dirty, snapshot) = match (dirty, snapshot) {
                (None, None) => {
                    self.current = None;
                    return Ok(());
                }
                (None, Some(_)) => {
                    self.current = Some(Current::Snapshot);
                    return Ok(());
                }
                (Some(dirty), None) => {
                    if dirty.value().is_empty() {
                        dirty.next()?;
                        continue;
                    }
                    self.current = Some(Current::Dirty);
                    return Ok(());
                }
                (Some(dirty), Some(snapshot)) => (dirty, snapshot),
            };

            match dirty.key().cmp(snapshot.key()) {
                Ordering::Equal => {
                    if dirty.value().is_empty() {
                        dirty.next()?;
                        snapshot.next()?;
                        continue;
                    }
                    self.current = Some(Current::Both);
                    return Ok(());
                }
                Ordering::Less => {
                    if dirty.value().is_empty() {
                        self.orphan_tombstones += 1;
                        warn!(
                            key = ?dirty.key(),
                            "skipping delete of a key absent from the snapshot"
                        );
                        dirty.next()?;
                        continue;
                    }
                    self.current = Some(Current::Dirty);
                    return Ok(());
                }
                Ordering::Greater => {
                    self.current = Some(Current::Snapshot);
                    return Ok(());
                }
            }
        }
    }
}

impl<D: EngineIterator, S: EngineIterator> EngineIterator for UnionIter<D, S> {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        match self.current {
            Some(Current::Dirty | Current::Both) => {
                self.dirty.as_ref().map_or(&[][..], |d| d.key())
            }
            Some(Current::Snapshot) => self.snapshot.as_ref().map_or(&[][..], |s| s.key()),
            None => &[],
        }
    }

    fn value(&self) -> &[u8] {
        match self.current {
            Some(Current::Dirty | Current::Both) => {
                self.dirty.as_ref().map_or(&[][..], |d| d.value())
            }
            Some(Current::Snapshot) => self.snapshot.as_ref().map_or(&[][..], |s| s.value()),
            None => &[],
        }
    }

    fn next(&mut self) -> StorageResult<()> {
        let Some(current) = self.current else {
            return Ok(());
        };
        if matches!(current, Current::Dirty | Current::Both) {
            if let Some(dirty) = self.dirty.as_mut() {
                dirty.next()?;
            }
        }
        if matches!(current, Current::Snapshot | Current::Both) {
            if let Some(snapshot) = self.snapshot.as_mut() {
                snapshot.next()?;
            }
        }
        self.position()
    }
}

/// Cursor over a range of the in-memory dirty overlay.
#[derive(Debug)]
pub struct DirtyIter<'a> {
    range: btree_map::Range<'a, Vec<u8>, Vec<u8>>,
    current: Option<(&'a Vec<u8>, &'a Vec<u8>)>,
}

impl<'a> DirtyIter<'a> {
    pub(crate) fn new(mut range: btree_map::Range<'a, Vec<u8>, Vec<u8>>) -> Self {
        let current = range.next();
        Self { range, current }
    }
}

impl EngineIterator for DirtyIter<'_> {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.map_or(&[][..], |(k, _)| k.as_slice())
    }

    fn value(&self) -> &[u8] {
        self.current.map_or(&[][..], |(_, v)| v.as_slice())
    }

    fn next(&mut self) -> StorageResult<()> {
        if self.current.is_some() {
            self.current = self.range.next();
        }
        Ok(())
    }
}

/// Wraps an iterator and ends it at the first key `stop` accepts.
#[derive(Debug)]
pub struct BoundedIter<I, F> {
    inner: I,
    stop: F,
    stopped: bool,
}

impl<I: EngineIterator, F: Fn(&[u8]) -> bool> BoundedIter<I, F> {
    /// Bounds `inner`, checking its current entry immediately.
    pub fn new(inner: I, stop: F) -> Self {
        let mut iter = Self {
            inner,
            stop,
            stopped: false,
        };
        iter.check_stop();
        iter
    }

    /// Returns the wrapped iterator.
    pub fn get_ref(&self) -> &I {
        &self.inner
    }

    fn check_stop(&mut self) {
        if self.inner.valid() && (self.stop)(self.inner.key()) {
            self.stopped = true;
        }
    }
}

impl<I: EngineIterator, F: Fn(&[u8]) -> bool> EngineIterator for BoundedIter<I, F> {
    fn valid(&self) -> bool {
        !self.stopped && self.inner.valid()
    }

    fn key(&self) -> &[u8] {
        if self.stopped {
            &[]
        } else {
            self.inner.key()
        }
    }

    fn value(&self) -> &[u8] {
        if self.stopped {
            &[]
        } else {
            self.inner.value()
        }
    }

    fn next(&mut self) -> StorageResult<()> {
        if self.stopped {
            return Ok(());
        }
        self.inner.next()?;
        self.check_stop();
        Ok(())
    }
}
