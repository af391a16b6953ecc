//! Transaction-level scans over user keys.

use crate::union::{BoundedIter, UnionStoreIter};
use siltkv_codec::decode_bytes;
use siltkv_storage::{EngineIterator, StorageResult};

type StopFn<'a> = Box<dyn Fn(&[u8]) -> bool + 'a>;

/// Decodes a stored key back into the user key, if it is one.
pub(crate) fn decode_user_key(encoded: &[u8]) -> Option<Vec<u8>> {
    match decode_bytes(encoded) {
        Ok((rest, key)) if rest.is_empty() => Some(key),
        _ => None,
    }
}

/// Ascending scan over a transaction's merged view.
///
/// Keys are the caller's raw keys, not their stored encoding. The scan ends
/// at the first key the stop predicate accepts, and at any stored key that
/// was not written through a transaction.
pub struct TxnIter<'a> {
    inner: BoundedIter<UnionStoreIter<'a>, StopFn<'a>>,
    key: Vec<u8>,
}

impl<'a> TxnIter<'a> {
    pub(crate) fn new<F>(inner: UnionStoreIter<'a>, stop: F) -> Self
    where
        F: Fn(&[u8]) -> bool + 'a,
    {
        let stop: StopFn<'a> = Box::new(move |encoded: &[u8]| {
            decode_user_key(encoded).is_none_or(|key| stop(&key))
        });
        let mut iter = Self {
            inner: BoundedIter::new(inner, stop),
            key: Vec::new(),
        };
        iter.refresh_key();
        iter
    }

    fn refresh_key(&mut self) {
        self.key = if self.inner.valid() {
            decode_user_key(self.inner.key()).unwrap_or_default()
        } else {
            Vec::new()
        };
    }

    /// Number of pending deletes skipped that had nothing to delete.
    #[must_use]
    pub fn orphan_tombstones(&self) -> usize {
        self.inner.get_ref().orphan_tombstones()
    }

    /// Collects the remaining entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails while advancing.
    pub fn collect_pairs(mut self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        while self.valid() {
            out.push((self.key().to_vec(), self.value().to_vec()));
            EngineIterator::next(&mut self)?;
        }
        Ok(out)
    }
}

impl EngineIterator for TxnIter<'_> {
    fn valid(&self) -> bool {
        self.inner.valid()
    }

    fn key(&self) -> &[u8] {
        &self.key
    }

    fn value(&self) -> &[u8] {
        self.inner.value()
    }

    fn next(&mut self) -> StorageResult<()> {
        self.inner.next()?;
        self.refresh_key();
        Ok(())
    }
}
