//! Store statistics.
//!
//! Counters are updated by transactions and the commit path and can be read
//! at any time through [`crate::Store::stats`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Store statistics.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct StoreStats {
    transactions_started: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_rolled_back: AtomicU64,
    conflicts: AtomicU64,
    keys_read: AtomicU64,
    keys_written: AtomicU64,
    batches_applied: AtomicU64,
}

impl StoreStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_begin(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self, keys_written: usize) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
        self.keys_written
            .fetch_add(keys_written as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_rollback(&self) {
        self.transactions_rolled_back
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self) {
        self.keys_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_batch(&self) {
        self.batches_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of transactions started.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the total number of transactions committed.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the total number of transactions rolled back, including
    /// ones dropped while active.
    pub fn transactions_rolled_back(&self) -> u64 {
        self.transactions_rolled_back.load(Ordering::Relaxed)
    }

    /// Returns the total number of commits that failed validation.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Returns the total number of point reads served to transactions.
    pub fn keys_read(&self) -> u64 {
        self.keys_read.load(Ordering::Relaxed)
    }

    /// Returns the total number of keys written or deleted by commits.
    pub fn keys_written(&self) -> u64 {
        self.keys_written.load(Ordering::Relaxed)
    }

    /// Returns the total number of write batches handed to the engine.
    pub fn batches_applied(&self) -> u64 {
        self.batches_applied.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_rolled_back: self.transactions_rolled_back(),
            conflicts: self.conflicts(),
            keys_read: self.keys_read(),
            keys_written: self.keys_written(),
            batches_applied: self.batches_applied(),
        }
    }
}

/// A point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Total number of transactions started.
    pub transactions_started: u64,
    /// Total number of transactions committed.
    pub transactions_committed: u64,
    /// Total number of transactions rolled back.
    pub transactions_rolled_back: u64,
    /// Total number of commit conflicts.
    pub conflicts: u64,
    /// Total number of point reads.
    pub keys_read: u64,
    /// Total number of keys written by commits.
    pub keys_written: u64,
    /// Total number of write batches applied.
    pub batches_applied: u64,
}
