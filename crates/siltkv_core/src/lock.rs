//! Key-level commit locks.
//!
//! A key is owned by at most one committing transaction at a time. Locks are
//! taken without waiting: a busy key reports its owner and the caller fails
//! its commit instead of queueing.

use crate::types::TransactionId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Maps locked keys to their owning transaction.
#[derive(Debug, Default)]
pub struct LockTable {
    owners: Mutex<HashMap<Vec<u8>, TransactionId>>,
}

impl LockTable {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes `key` for `owner`. Re-locking a key already owned by `owner`
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns the current owner if another transaction holds the key.
    pub fn try_lock(&self, key: &[u8], owner: TransactionId) -> Result<(), TransactionId> {
        let mut owners = self.owners.lock();
        match owners.get(key) {
            Some(&held) if held != owner => Err(held),
            Some(_) => Ok(()),
            None => {
                owners.insert(key.to_vec(), owner);
                Ok(())
            }
        }
    }

    /// Releases `key` if `owner` holds it. Returns true if a lock was released.
    pub fn unlock(&self, key: &[u8], owner: TransactionId) -> bool {
        let mut owners = self.owners.lock();
        if owners.get(key) == Some(&owner) {
            owners.remove(key);
            true
        } else {
            false
        }
    }

    /// Returns the transaction holding `key`, if any.
    #[must_use]
    pub fn owner(&self, key: &[u8]) -> Option<TransactionId> {
        self.owners.lock().get(key).copied()
    }

    /// Returns the number of held locks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.lock().len()
    }

    /// Returns true if no key is locked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases every key recorded during one commit attempt when dropped.
#[derive(Debug)]
pub(crate) struct HeldLocks<'a> {
    table: &'a LockTable,
    owner: TransactionId,
    keys: Vec<Vec<u8>>,
}

impl<'a> HeldLocks<'a> {
    pub(crate) fn new(table: &'a LockTable, owner: TransactionId) -> Self {
        Self {
            table,
            owner,
            keys: Vec::new(),
        }
    }

    /// Records `key` for release. Call before attempting the lock so a
    /// partially acquired set is still released.
    pub(crate) fn track(&mut self, key: &[u8]) {
        self.keys.push(key.to_vec());
    }
}

impl Drop for HeldLocks<'_> {
    fn drop(&mut self) {
        for key in &self.keys {
            self.table.unlock(key, self.owner);
        }
    }
}
