//! Transaction state and the commit protocol.

use crate::error::{CoreError, CoreResult};
use crate::lock::HeldLocks;
use crate::store::Store;
use crate::transaction::iter::TxnIter;
use crate::types::TransactionId;
use crate::union::UnionStore;
use siltkv_codec::encode_bytes;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Commit was attempted and failed; nothing was written.
    Aborted,
    /// Transaction was rolled back, explicitly or by being dropped.
    RolledBack,
}

/// Encodes a user key into its stored form.
pub(crate) fn encode_user_key(key: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + key.len() / 8 + 9);
    encode_bytes(&mut buf, key);
    buf
}

/// An optimistic transaction.
///
/// Reads see the snapshot taken at [`Store::begin`] plus this transaction's
/// own pending writes. Nothing reaches the engine until [`commit`], which
/// validates every key in the read-set against the latest committed state
/// and then applies all pending writes as one batch.
///
/// A transaction that is dropped while still active is rolled back.
///
/// [`commit`]: Transaction::commit
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    store: Store,
    union: UnionStore,
    /// Stored key -> value seen in the snapshot at first touch (empty if absent).
    read_set: BTreeMap<Vec<u8>, Vec<u8>>,
    state: TransactionState,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId, store: Store, union: UnionStore) -> Self {
        Self {
            id,
            store,
            union,
            read_set: BTreeMap::new(),
            state: TransactionState::Active,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Number of keys whose first-seen value will be validated at commit.
    #[must_use]
    pub fn read_set_len(&self) -> usize {
        self.read_set.len()
    }

    /// Number of pending writes, deletes included.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.union.dirty_len()
    }

    /// Reads `key`.
    ///
    /// The key joins the read-set, so a concurrent change to it makes this
    /// transaction's commit fail.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotExist`] if the key is absent or deleted, and
    /// [`CoreError::InvalidTransaction`] if the transaction is closed.
    pub fn get(&mut self, key: &[u8]) -> CoreResult<Vec<u8>> {
        self.ensure_active()?;
        debug!(txn = %self.id, key = ?key, "get");
        let stored = encode_user_key(key);
        self.mark_origin(&stored)?;
        self.store.stats_ref().record_read();
        self.union.get(&stored)
    }

    /// Stages `key = value`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CannotSetNilValue`] for an empty value; empty
    /// values are reserved as deletion markers.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.ensure_active()?;
        if value.is_empty() {
            return Err(CoreError::CannotSetNilValue);
        }
        debug!(txn = %self.id, key = ?key, len = value.len(), "set");
        self.union.set(&encode_user_key(key), value)
    }

    /// Stages a delete of `key`, whether or not it exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransaction`] if the transaction is closed.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<()> {
        self.ensure_active()?;
        debug!(txn = %self.id, key = ?key, "delete");
        self.union.delete(&encode_user_key(key))
    }

    /// Adds `step` to the decimal counter stored at `key` and returns the new
    /// value. An absent counter starts at `step`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for a zero step or on overflow,
    /// and [`CoreError::ParseInt`] if the stored value is not a decimal
    /// integer.
    pub fn inc(&mut self, key: &[u8], step: i64) -> CoreResult<i64> {
        self.ensure_active()?;
        if step == 0 {
            return Err(CoreError::invalid_argument("inc step must be non-zero"));
        }
        debug!(txn = %self.id, key = ?key, step, "inc");
        let stored = encode_user_key(key);
        self.mark_origin(&stored)?;

        let next = match self.union.get(&stored) {
            Ok(current) => String::from_utf8_lossy(&current)
                .parse::<i64>()?
                .checked_add(step)
                .ok_or_else(|| CoreError::invalid_argument("counter overflow"))?,
            Err(CoreError::NotExist) => step,
            Err(e) => return Err(e),
        };
        self.union.set(&stored, next.to_string().as_bytes())?;
        Ok(next)
    }

    /// Adds `keys` to the read-set without reading them, so the commit fails
    /// if any of them changes in the meantime.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is closed or the engine fails.
    pub fn lock_keys<I, K>(&mut self, keys: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        self.ensure_active()?;
        for key in keys {
            let key = key.as_ref();
            debug!(txn = %self.id, key = ?key, "lock key");
            self.mark_origin(&encode_user_key(key))?;
        }
        Ok(())
    }

    /// Scans from the first key `>= key` to the end of the key space.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is closed or the engine fails.
    pub fn seek(&self, key: &[u8]) -> CoreResult<TxnIter<'_>> {
        self.seek_until(key, |_: &[u8]| false)
    }

    /// Scans from the first key `>= key` up to, not including, the first key
    /// `stop` accepts.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is closed or the engine fails.
    pub fn seek_until<'a, F>(&'a self, key: &[u8], stop: F) -> CoreResult<TxnIter<'a>>
    where
        F: Fn(&[u8]) -> bool + 'a,
    {
        self.ensure_active()?;
        debug!(txn = %self.id, key = ?key, "seek");
        let inner = self.union.seek(&encode_user_key(key))?;
        Ok(TxnIter::new(inner, stop))
    }

    /// Scans every key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is closed or the engine fails.
    pub fn scan_prefix(&self, prefix: &[u8]) -> CoreResult<TxnIter<'_>> {
        let owned = prefix.to_vec();
        self.seek_until(prefix, move |key: &[u8]| !key.starts_with(&owned))
    }

    /// Validates the read-set and applies all pending writes atomically.
    ///
    /// The transaction is closed afterwards whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Conflict`] if a key in the read-set is locked by
    /// another committing transaction or changed since it was first read.
    /// Nothing is written in that case; retry from a fresh transaction.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        let writes = self.union.dirty_len();
        info!(
            txn = %self.id,
            writes,
            reads = self.read_set.len(),
            "commit"
        );

        let result = self.do_commit();
        let stats = self.store.stats_ref();
        match &result {
            Ok(()) => {
                stats.record_commit(writes);
                self.close(TransactionState::Committed);
            }
            Err(e) => {
                if e.is_conflict() {
                    stats.record_conflict();
                }
                warn!(txn = %self.id, error = %e, "commit failed");
                self.close(TransactionState::Aborted);
            }
        }
        result
    }

    fn do_commit(&self) -> CoreResult<()> {
        let mut held = HeldLocks::new(self.store.locks(), self.id);
        for (key, expected) in &self.read_set {
            held.track(key);
            self.store.try_condition_lock_key(self.id, key, expected)?;
        }

        if self.union.dirty_len() == 0 {
            return Ok(());
        }
        let mut batch = self.store.new_batch();
        for (key, value) in self.union.dirty_entries() {
            if value.is_empty() {
                batch.delete(key);
            } else {
                batch.put(key, value);
            }
        }
        self.store.write_batch(batch)
    }

    /// Discards pending writes without touching the engine.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransaction`] if the transaction is
    /// already closed.
    pub fn rollback(&mut self) -> CoreResult<()> {
        self.ensure_active()?;
        warn!(txn = %self.id, discarded = self.union.dirty_len(), "rollback");
        self.discard();
        Ok(())
    }

    fn discard(&mut self) {
        self.store.stats_ref().record_rollback();
        self.close(TransactionState::RolledBack);
    }

    fn mark_origin(&mut self, stored: &[u8]) -> CoreResult<()> {
        if self.read_set.contains_key(stored) {
            return Ok(());
        }
        let value = self.union.snapshot_get(stored)?.unwrap_or_default();
        self.read_set.insert(stored.to_vec(), value);
        Ok(())
    }

    fn close(&mut self, state: TransactionState) {
        self.union.close();
        self.read_set.clear();
        self.state = state;
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            _ => Err(CoreError::InvalidTransaction),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.is_active() {
            return;
        }
        let discarded = self.union.dirty_len();
        if discarded == 0 {
            debug!(txn = %self.id, "dropped read-only transaction");
        } else {
            warn!(txn = %self.id, discarded, "dropped transaction with pending writes");
        }
        self.discard();
    }
}
