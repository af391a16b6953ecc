//! The store: engine handle, transaction ids and commit locks.

use crate::config::Config;
use crate::error::{ConflictKind, CoreError, CoreResult};
use crate::lock::LockTable;
use crate::stats::{StatsSnapshot, StoreStats};
use crate::transaction::Transaction;
use crate::types::TransactionId;
use crate::union::UnionStore;
use siltkv_storage::{FileEngine, InMemoryEngine, StorageEngine, WriteBatch};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct StoreInner {
    engine: Box<dyn StorageEngine>,
    next_txn_id: AtomicU64,
    locks: LockTable,
    stats: StoreStats,
}

/// A transactional key-value store.
///
/// `Store` is a cheap handle: clones share the same engine, lock table and
/// transaction counter, and can be moved across threads. Every transaction
/// holds a handle, so the engine stays open while any transaction lives.
///
/// # Example
///
/// ```rust
/// use siltkv_core::Store;
///
/// let store = Store::open_in_memory();
/// let mut txn = store.begin().unwrap();
/// txn.set(b"greeting", b"hello").unwrap();
/// txn.commit().unwrap();
///
/// let mut txn = store.begin().unwrap();
/// assert_eq!(txn.get(b"greeting").unwrap(), b"hello");
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("next_txn_id", &self.inner.next_txn_id)
            .field("locked_keys", &self.inner.locks.len())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens or creates an on-disk store in directory `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is locked by another process, its
    /// log is corrupted, or `config` forbids opening it.
    pub fn open(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref();
        let engine = FileEngine::open(path, config.engine_options())?;
        info!(path = %path.display(), keys = engine.len(), "opened store");
        Ok(Self::with_engine(engine))
    }

    /// Creates an empty store that lives only in memory.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::with_engine(InMemoryEngine::new())
    }

    /// Wraps an already opened engine.
    #[must_use]
    pub fn with_engine(engine: impl StorageEngine + 'static) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                engine: Box::new(engine),
                next_txn_id: AtomicU64::new(1),
                locks: LockTable::new(),
                stats: StoreStats::new(),
            }),
        }
    }

    /// Starts a transaction over a snapshot of the current committed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed.
    pub fn begin(&self) -> CoreResult<Transaction> {
        let snapshot = self.inner.engine.snapshot()?;
        let id = TransactionId::new(self.inner.next_txn_id.fetch_add(1, Ordering::SeqCst));
        self.inner.stats.record_begin();
        debug!(txn = %id, sequence = snapshot.sequence(), "begin");
        Ok(Transaction::new(id, self.clone(), UnionStore::new(snapshot)))
    }

    /// Takes the commit lock on `key` for `txn` and checks that the latest
    /// committed value still equals `expected` (empty meaning absent).
    ///
    /// On a value mismatch the lock stays held; release it with
    /// [`unlock_key`](Self::unlock_key).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] if another transaction holds the lock
    /// or the value changed.
    pub fn try_condition_lock_key(
        &self,
        txn: TransactionId,
        key: &[u8],
        expected: &[u8],
    ) -> CoreResult<()> {
        if let Err(owner) = self.inner.locks.try_lock(key, txn) {
            warn!(%txn, %owner, key = ?key, "commit key locked by another transaction");
            return Err(CoreError::conflict(txn, key, ConflictKind::Locked { owner }));
        }
        let current = self.inner.engine.get(key)?.unwrap_or_default();
        if current != expected {
            warn!(%txn, key = ?key, "key changed since first read");
            return Err(CoreError::conflict(txn, key, ConflictKind::ValueChanged));
        }
        Ok(())
    }

    /// Releases `key` if `txn` holds it; no-op otherwise.
    pub fn unlock_key(&self, txn: TransactionId, key: &[u8]) -> bool {
        self.inner.locks.unlock(key, txn)
    }

    /// Creates an empty write batch for this store's engine.
    #[must_use]
    pub fn new_batch(&self) -> WriteBatch {
        self.inner.engine.new_batch()
    }

    /// Applies `batch` to the engine atomically, bypassing transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch holds an empty value or the engine fails.
    pub fn write_batch(&self, batch: WriteBatch) -> CoreResult<()> {
        self.inner.engine.commit(batch)?;
        self.inner.stats.record_batch();
        Ok(())
    }

    /// Direct access to the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &dyn StorageEngine {
        self.inner.engine.as_ref()
    }

    /// The commit lock table.
    #[must_use]
    pub fn locks(&self) -> &LockTable {
        &self.inner.locks
    }

    pub(crate) fn stats_ref(&self) -> &StoreStats {
        &self.inner.stats
    }

    /// Returns a snapshot of the store counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Reclaims space held by superseded data.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or rewriting fails.
    pub fn compact(&self) -> CoreResult<()> {
        self.inner.engine.compact()?;
        Ok(())
    }

    /// Closes the engine. Later operations on any handle fail.
    ///
    /// # Errors
    ///
    /// Returns an error if pending data cannot be flushed.
    pub fn close(&self) -> CoreResult<()> {
        self.inner.engine.close()?;
        info!("closed store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn transaction_ids_increase() {
        let store = Store::open_in_memory();
        let a = store.begin().unwrap();
        let b = store.clone().begin().unwrap();
        assert!(a.id() < b.id());
        assert_eq!(store.stats().transactions_started, 2);
    }

    #[test]
    fn condition_lock_checks_owner_then_value() {
        let store = Store::open_in_memory();
        let mut batch = store.new_batch();
        batch.put(b"k".to_vec(), b"v".to_vec());
        store.write_batch(batch).unwrap();

        let t1 = TransactionId::new(100);
        let t2 = TransactionId::new(101);
        store.try_condition_lock_key(t1, b"k", b"v").unwrap();
        store.try_condition_lock_key(t1, b"k", b"v").unwrap();

        let err = store.try_condition_lock_key(t2, b"k", b"v").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict {
                reason: ConflictKind::Locked { owner },
                ..
            } if owner == t1
        ));

        assert!(!store.unlock_key(t2, b"k"));
        assert!(store.unlock_key(t1, b"k"));

        let err = store.try_condition_lock_key(t2, b"k", b"").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Conflict {
                reason: ConflictKind::ValueChanged,
                ..
            }
        ));
        assert_eq!(store.locks().owner(b"k"), Some(t2));
        store.unlock_key(t2, b"k");
        assert!(store.locks().is_empty());
    }

    #[test]
    fn absent_key_matches_empty_expectation() {
        let store = Store::open_in_memory();
        let t = TransactionId::new(1);
        store.try_condition_lock_key(t, b"missing", b"").unwrap();
        store.unlock_key(t, b"missing");
    }

    #[test]
    fn file_store_persists_commits() {
        let dir = tempdir().unwrap();
        {
            let store = Store::open(dir.path(), Config::default()).unwrap();
            let mut txn = store.begin().unwrap();
            txn.set(b"k", b"v").unwrap();
            txn.inc(b"seq", 1).unwrap();
            txn.commit().unwrap();
            store.close().unwrap();
        }

        let store = Store::open(dir.path(), Config::default()).unwrap();
        let mut txn = store.begin().unwrap();
        assert_eq!(txn.get(b"k").unwrap(), b"v");
        assert_eq!(txn.inc(b"seq", 1).unwrap(), 2);
    }

    #[test]
    fn closed_store_refuses_new_transactions() {
        let store = Store::open_in_memory();
        store.close().unwrap();
        assert!(matches!(store.begin(), Err(CoreError::Storage(_))));
    }

    #[test]
    fn compact_keeps_data() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path(), Config::new().sync_on_commit(false)).unwrap();
        for i in 0..20 {
            let mut txn = store.begin().unwrap();
            txn.set(b"k", format!("{i}").as_bytes()).unwrap();
            txn.commit().unwrap();
        }
        store.compact().unwrap();
        let mut txn = store.begin().unwrap();
        assert_eq!(txn.get(b"k").unwrap(), b"19");
    }
}
