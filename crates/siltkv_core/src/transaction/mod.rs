//! Optimistic transactions.
//!
//! siltkv transactions provide:
//! - **Snapshot isolation**: reads see the state at `begin` plus own writes
//! - **Read-set validation**: commit fails if anything read has since changed
//! - **Atomicity**: all pending writes reach the engine in one batch, or none do

mod iter;
mod state;

pub use iter::TxnIter;
pub use state::{Transaction, TransactionState};
