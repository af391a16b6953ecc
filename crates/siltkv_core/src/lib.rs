//! # siltkv Core
//!
//! Transactional layer of siltkv.
//!
//! This crate provides:
//! - Dirty overlays ([`UnionStore`]) over immutable engine snapshots
//! - Merged iteration ([`UnionIter`]) that hides tombstones
//! - Optimistic transactions with read-set validation at commit
//! - The [`Store`] handle: transaction ids, commit locks and counters
//!
//! ## Quick Start
//!
//! ```rust
//! use siltkv_core::{EngineIterator, Store};
//!
//! let store = Store::open_in_memory();
//!
//! let mut txn = store.begin().unwrap();
//! txn.set(b"user:1", b"alice").unwrap();
//! txn.set(b"user:2", b"bob").unwrap();
//! txn.commit().unwrap();
//!
//! let mut txn = store.begin().unwrap();
//! assert_eq!(txn.inc(b"visits", 1).unwrap(), 1);
//! let mut users = txn.scan_prefix(b"user:").unwrap();
//! assert_eq!(users.key(), b"user:1");
//! users.next().unwrap();
//! assert_eq!(users.value(), b"bob");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod lock;
mod prefix;
mod stats;
mod store;
mod transaction;
mod types;
pub mod union;

pub use config::Config;
pub use error::{ConflictKind, CoreError, CoreResult};
pub use lock::LockTable;
pub use prefix::{decode_record_handle, delete_with_prefix, encode_record_key, scan_with_prefix};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::Store;
pub use transaction::{Transaction, TransactionState, TxnIter};
pub use types::TransactionId;
pub use union::{UnionIter, UnionStore};

/// Version of the siltkv core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use siltkv_codec as codec;
pub use siltkv_storage as storage;
pub use siltkv_storage::{EngineIterator, StorageEngine};
