//! Multi-version ordered table shared by both engines.
//!
//! Every committed batch gets the next sequence number and appends one
//! version per touched key. A snapshot pins a sequence and reads the newest
//! version at or below it. Versions that no pinned snapshot can reach are
//! pruned whenever their key is written again.

use crate::batch::{BatchOp, WriteBatch};
use crate::engine::{EngineIterator, Snapshot};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Version {
    seq: u64,
    /// `None` marks a deletion.
    value: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
struct TableState {
    entries: BTreeMap<Vec<u8>, Vec<Version>>,
    sequence: u64,
    /// Pinned sequence -> number of live snapshots at it.
    pinned: BTreeMap<u64, usize>,
    closed: bool,
}

impl TableState {
    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }
}

fn visible(chain: &[Version], seq: u64) -> Option<&[u8]> {
    chain
        .iter()
        .rev()
        .find(|v| v.seq <= seq)
        .and_then(|v| v.value.as_deref())
}

/// Drops versions older than the one the oldest snapshot reads.
/// Returns false if the key no longer needs an entry at all.
fn prune(chain: &mut Vec<Version>, horizon: Option<u64>) -> bool {
    let keep_from = match horizon {
        None => chain.len().saturating_sub(1),
        Some(h) => chain.iter().rposition(|v| v.seq <= h).unwrap_or(0),
    };
    chain.drain(..keep_from);
    !(chain.len() == 1 && chain[0].value.is_none())
}

/// The ordered, versioned key space behind an engine.
#[derive(Debug, Default)]
pub(crate) struct VersionedTable {
    state: RwLock<TableState>,
}

impl VersionedTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn close(&self) {
        self.state.write().closed = true;
    }

    pub(crate) fn ensure_open(&self) -> StorageResult<()> {
        self.state.read().ensure_open()
    }

    pub(crate) fn get_latest(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state
            .entries
            .get(key)
            .and_then(|chain| chain.last())
            .and_then(|v| v.value.clone()))
    }

    fn get_at(&self, key: &[u8], seq: u64) -> StorageResult<Option<Vec<u8>>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state
            .entries
            .get(key)
            .and_then(|chain| visible(chain, seq))
            .map(<[u8]>::to_vec))
    }

    /// First key after `from` with a live value at `seq`.
    fn next_visible(
        &self,
        from: Bound<&[u8]>,
        seq: u64,
    ) -> StorageResult<Option<(Vec<u8>, Vec<u8>)>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state
            .entries
            .range::<[u8], _>((from, Bound::Unbounded))
            .find_map(|(key, chain)| visible(chain, seq).map(|v| (key.clone(), v.to_vec()))))
    }

    /// Applies a validated batch under the next sequence number.
    pub(crate) fn apply(&self, batch: &WriteBatch) -> StorageResult<u64> {
        let mut state = self.state.write();
        state.ensure_open()?;
        state.sequence += 1;
        let seq = state.sequence;
        let horizon = state.pinned.keys().next().copied();

        for op in batch.iter() {
            let value = match op {
                BatchOp::Put { value, .. } => Some(value.clone()),
                BatchOp::Delete { .. } => None,
            };
            let key = op.key();
            let keep = match state.entries.get_mut(key) {
                Some(chain) => {
                    if chain.last().is_some_and(|v| v.seq == seq) {
                        chain.pop();
                    }
                    chain.push(Version { seq, value });
                    prune(chain, horizon)
                }
                None if value.is_none() => continue,
                None => {
                    state
                        .entries
                        .insert(key.to_vec(), vec![Version { seq, value }]);
                    continue;
                }
            };
            if !keep {
                state.entries.remove(key);
            }
        }
        Ok(seq)
    }

    pub(crate) fn pin(self: &Arc<Self>) -> StorageResult<TableSnapshot> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let seq = state.sequence;
        *state.pinned.entry(seq).or_insert(0) += 1;
        Ok(TableSnapshot {
            pin: Arc::new(Pin {
                table: Arc::clone(self),
                seq,
            }),
        })
    }

    fn unpin(&self, seq: u64) {
        let mut state = self.state.write();
        if let Some(count) = state.pinned.get_mut(&seq) {
            *count -= 1;
            if *count == 0 {
                state.pinned.remove(&seq);
            }
        }
    }

    /// Prunes every key against the current oldest snapshot.
    pub(crate) fn collect_garbage(&self) {
        let mut state = self.state.write();
        let horizon = state.pinned.keys().next().copied();
        state.entries.retain(|_, chain| prune(chain, horizon));
    }

    /// Latest live entries in key order.
    pub(crate) fn live_entries(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state
            .entries
            .iter()
            .filter_map(|(k, chain)| {
                chain
                    .last()
                    .and_then(|v| v.value.clone())
                    .map(|v| (k.clone(), v))
            })
            .collect())
    }

    /// Number of keys with a live latest value.
    pub(crate) fn live_len(&self) -> usize {
        self.state
            .read()
            .entries
            .values()
            .filter(|chain| chain.last().is_some_and(|v| v.value.is_some()))
            .count()
    }

    /// Total stored versions, live or not.
    pub(crate) fn version_count(&self) -> usize {
        self.state.read().entries.values().map(Vec::len).sum()
    }

    pub(crate) fn pinned_count(&self) -> usize {
        self.state.read().pinned.values().sum()
    }
}

/// Keeps a sequence pinned until the last holder drops it.
#[derive(Debug)]
struct Pin {
    table: Arc<VersionedTable>,
    seq: u64,
}

impl Drop for Pin {
    fn drop(&mut self) {
        self.table.unpin(self.seq);
    }
}

/// A snapshot of a [`VersionedTable`].
#[derive(Debug)]
pub(crate) struct TableSnapshot {
    pin: Arc<Pin>,
}

impl Snapshot for TableSnapshot {
    fn sequence(&self) -> u64 {
        self.pin.seq
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.pin.table.get_at(key, self.pin.seq)
    }

    fn iter(&self, start: &[u8]) -> StorageResult<Box<dyn EngineIterator + Send>> {
        let current = self
            .pin
            .table
            .next_visible(Bound::Included(start), self.pin.seq)?;
        Ok(Box::new(TableIter {
            pin: Arc::clone(&self.pin),
            current,
        }))
    }
}

/// Cursor over a snapshot. Each step re-seeks past the last key, so no
/// table lock is held between calls.
#[derive(Debug)]
struct TableIter {
    pin: Arc<Pin>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl EngineIterator for TableIter {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map_or(&[][..], |(k, _)| k.as_slice())
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map_or(&[][..], |(_, v)| v.as_slice())
    }

    fn next(&mut self) -> StorageResult<()> {
        if let Some((key, _)) = self.current.take() {
            self.current = self
                .pin
                .table
                .next_visible(Bound::Excluded(key.as_slice()), self.pin.seq)?;
        }
        Ok(())
    }
}
