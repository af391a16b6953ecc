//! Dirty overlay and merged iteration.
//!
//! A transaction's pending writes live in a [`UnionStore`] on top of the
//! snapshot taken when it began. Reads consult the overlay first; scans
//! merge both sides through a [`UnionIter`].

mod iter;
mod store;

pub use iter::{BoundedIter, DirtyIter, UnionIter};
pub use store::{UnionStore, UnionStoreIter};
