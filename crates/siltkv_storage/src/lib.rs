//! # siltkv Storage
//!
//! Ordered byte-store engines for siltkv.
//!
//! This crate provides the lowest layer of the store. Engines are **opaque
//! byte stores** - they order keys by unsigned byte comparison and never
//! interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Point reads, point-in-time snapshots, and atomic write batches
//! - Snapshots are isolated from every later commit
//! - No knowledge of transactions, key encoding, or tombstones
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Engines
//!
//! - [`InMemoryEngine`] - For testing and ephemeral stores
//! - [`FileEngine`] - For persistent storage in a directory
//!
//! ## Example
//!
//! ```rust
//! use siltkv_storage::{EngineIterator, InMemoryEngine, StorageEngine};
//!
//! let engine = InMemoryEngine::new();
//! let mut batch = engine.new_batch();
//! batch.put(b"hello".to_vec(), b"world".to_vec());
//! engine.commit(batch).unwrap();
//!
//! let snapshot = engine.snapshot().unwrap();
//! let it = snapshot.iter(b"").unwrap();
//! assert_eq!(it.key(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod engine;
mod error;
mod file;
pub mod log;
mod memory;
mod mvcc;

pub use batch::{BatchOp, WriteBatch};
pub use engine::{EngineIterator, Snapshot, StorageEngine};
pub use error::{StorageError, StorageResult};
pub use file::{FileEngine, FileEngineOptions};
pub use memory::InMemoryEngine;
