//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use siltkv_core::{Config, Store};
use std::path::Path;
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Store::open_in_memory(),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test store in a fresh temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::new().sync_on_commit(false))
    }

    /// Creates a file-based test store with `config`.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open(temp_dir.path(), config).expect("Failed to open file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes and reopens a file-based store in place.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores, which cannot be reopened.
    pub fn reopen(&mut self) {
        let path = self
            .path()
            .expect("Only file stores can be reopened")
            .to_path_buf();
        self.store.close().expect("Failed to close store");
        self.store = Store::open(&path, Config::new().sync_on_commit(false))
            .expect("Failed to reopen store");
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use siltkv_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     let mut txn = store.begin().unwrap();
///     txn.set(b"k", b"v").unwrap();
///     txn.commit().unwrap();
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a temporary file-based store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store, &Path) -> R,
{
    let test_store = TestStore::file();
    let path = test_store.path().expect("File store should have a path");
    f(&test_store.store, path)
}

/// Runs `f` once against each engine kind, labelled for assertion messages.
pub fn with_each_engine<F>(mut f: F)
where
    F: FnMut(&str, &Store),
{
    let memory = TestStore::memory();
    f("memory", &memory);
    let file = TestStore::file();
    f("file", &file);
}

/// Commits `pairs` in a single transaction.
pub fn seed<K, V>(store: &Store, pairs: &[(K, V)])
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut txn = store.begin().expect("Failed to begin");
    for (key, value) in pairs {
        txn.set(key.as_ref(), value.as_ref()).expect("Failed to set");
    }
    txn.commit().expect("Failed to commit seed data");
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a store holding `count` keys `key:00000..` with values
    /// `value:<i>`.
    pub fn populated_store(count: usize) -> TestStore {
        let test_store = TestStore::memory();
        let mut txn = test_store.begin().expect("Failed to begin");
        for i in 0..count {
            txn.set(
                format!("key:{i:05}").as_bytes(),
                format!("value:{i}").as_bytes(),
            )
            .expect("Failed to set");
        }
        txn.commit().expect("Failed to commit");
        test_store
    }

    /// Creates a store with `partitions` prefixes (`p0/`, `p1/`, ..), each
    /// holding `per_partition` keys.
    pub fn partitioned_store(partitions: usize, per_partition: usize) -> TestStore {
        let test_store = TestStore::memory();
        let mut txn = test_store.begin().expect("Failed to begin");
        for p in 0..partitions {
            for i in 0..per_partition {
                txn.set(format!("p{p}/{i:03}").as_bytes(), b"x")
                    .expect("Failed to set");
            }
        }
        txn.commit().expect("Failed to commit");
        test_store
    }
}
