//! Core type definitions for siltkv.

use std::fmt;

/// Unique identifier for a transaction.
///
/// Transaction IDs are monotonically increasing per store and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_display_and_order() {
        assert_eq!(TransactionId::new(7).to_string(), "txn:7");
        assert!(TransactionId::new(1) < TransactionId::new(2));
        assert_eq!(TransactionId::new(9).as_u64(), 9);
    }
}
