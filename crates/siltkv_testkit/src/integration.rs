//! Cross-crate integration test helpers.
//!
//! Provides a model-checked harness and reusable transaction scenarios
//! that run against any [`Store`].

use crate::generators::TxnOperation;
use siltkv_core::{CoreError, EngineIterator, Store};
use std::collections::BTreeMap;

/// A test harness that mirrors every committed write in a model map.
pub struct IntegrationHarness {
    /// The store instance.
    pub store: Store,
    model: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl IntegrationHarness {
    /// Creates a harness over an in-memory store.
    pub fn new() -> Self {
        Self::with_store(Store::open_in_memory())
    }

    /// Creates a harness over `store`, which must start empty.
    pub fn with_store(store: Store) -> Self {
        Self {
            store,
            model: BTreeMap::new(),
        }
    }

    /// Runs `ops` in one transaction and commits it, updating the model.
    pub fn apply(&mut self, ops: &[TxnOperation]) {
        let mut txn = self.store.begin().expect("Failed to begin");
        let mut staged = self.model.clone();
        for op in ops {
            match op {
                TxnOperation::Set { key, value } => {
                    txn.set(key, value).expect("Failed to set");
                    staged.insert(key.clone(), value.clone());
                }
                TxnOperation::Delete { key } => {
                    txn.delete(key).expect("Failed to delete");
                    staged.remove(key);
                }
                TxnOperation::Get { key } => match txn.get(key) {
                    Ok(value) => assert_eq!(Some(&value), staged.get(key), "read mismatch"),
                    Err(CoreError::NotExist) => {
                        assert!(!staged.contains_key(key), "key unexpectedly missing");
                    }
                    Err(e) => panic!("unexpected read error: {e}"),
                },
            }
        }
        txn.commit().expect("Failed to commit");
        self.model = staged;
    }

    /// Checks that a full scan matches the model exactly.
    pub fn verify_all(&self) {
        let txn = self.store.begin().expect("Failed to begin");
        let mut iter = txn.seek(b"").expect("Failed to seek");
        let mut actual = BTreeMap::new();
        while iter.valid() {
            actual.insert(iter.key().to_vec(), iter.value().to_vec());
            iter.next().expect("Failed to advance");
        }
        assert_eq!(actual, self.model, "store diverged from model");
    }

    /// Returns the number of keys the model holds.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Transaction scenario tests.
pub mod transaction {
    use super::*;

    /// A transaction does not see writes committed after it began.
    pub fn test_snapshot_isolation(store: &Store) {
        crate::fixtures::seed(store, &[("iso", "before")]);
        let mut reader = store.begin().expect("Failed to begin");
        crate::fixtures::seed(store, &[("iso", "after")]);
        assert_eq!(reader.get(b"iso").expect("Failed to get"), b"before");
        drop(reader);
        let mut fresh = store.begin().expect("Failed to begin");
        assert_eq!(fresh.get(b"iso").expect("Failed to get"), b"after");
    }

    /// Rolled back writes never become visible.
    pub fn test_rollback_discards(store: &Store) {
        let mut txn = store.begin().expect("Failed to begin");
        txn.set(b"discarded", b"x").expect("Failed to set");
        txn.rollback().expect("Failed to roll back");
        let mut check = store.begin().expect("Failed to begin");
        assert!(check.get(b"discarded").is_err_and(|e| e.is_not_found()));
    }

    /// Two transactions read the same key; the later committer conflicts and
    /// none of its writes land.
    pub fn test_read_write_conflict(store: &Store) {
        crate::fixtures::seed(store, &[("conflict:a", "0")]);
        let mut t1 = store.begin().expect("Failed to begin");
        let mut t2 = store.begin().expect("Failed to begin");
        t1.get(b"conflict:a").expect("Failed to get");
        t2.get(b"conflict:a").expect("Failed to get");
        t1.set(b"conflict:a", b"1").expect("Failed to set");
        t2.set(b"conflict:a", b"2").expect("Failed to set");
        t2.set(b"conflict:b", b"2").expect("Failed to set");
        t1.commit().expect("First committer must win");
        let err = t2.commit().expect_err("Second committer must conflict");
        assert!(err.is_conflict());

        let mut check = store.begin().expect("Failed to begin");
        assert_eq!(check.get(b"conflict:a").expect("Failed to get"), b"1");
        assert!(check.get(b"conflict:b").is_err_and(|e| e.is_not_found()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::with_each_engine;

    #[test]
    fn harness_tracks_model() {
        let mut harness = IntegrationHarness::new();
        harness.apply(&[
            TxnOperation::Set {
                key: b"a".to_vec(),
                value: b"1".to_vec(),
            },
            TxnOperation::Set {
                key: b"b".to_vec(),
                value: b"2".to_vec(),
            },
            TxnOperation::Get { key: b"a".to_vec() },
        ]);
        harness.apply(&[
            TxnOperation::Delete { key: b"a".to_vec() },
            TxnOperation::Get { key: b"a".to_vec() },
        ]);
        assert_eq!(harness.tracked_count(), 1);
        harness.verify_all();
    }

    #[test]
    fn scenarios_hold_on_each_engine() {
        with_each_engine(|_, store| {
            transaction::test_snapshot_isolation(store);
            transaction::test_rollback_discards(store);
            transaction::test_read_write_conflict(store);
        });
    }
}
