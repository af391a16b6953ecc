//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;
use siltkv_codec::Value;

/// Strategy for generating codec values of every kind (NaN excluded).
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::Uint),
        any::<f64>()
            .prop_filter("NaN has no order", |f| !f.is_nan())
            .prop_map(Value::Float),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
    ]
}

/// Strategy for generating key tuples of `1..max_len` values.
pub fn tuple_strategy(max_len: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(value_strategy(), 1..max_len.max(2))
}

/// Strategy for generating user keys from a small alphabet, so that
/// generated operations collide often.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c', 0x00, 0xFF]), 0..4)
}

/// Strategy for generating non-empty values.
pub fn nonempty_value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..32)
}

/// A single step of a randomly generated transaction.
#[derive(Debug, Clone)]
pub enum TxnOperation {
    /// Stage a write
    Set {
        /// User key
        key: Vec<u8>,
        /// Non-empty value
        value: Vec<u8>,
    },
    /// Stage a delete
    Delete {
        /// User key
        key: Vec<u8>,
    },
    /// Read a key
    Get {
        /// User key
        key: Vec<u8>,
    },
}

/// Strategy for generating transaction operations.
pub fn txn_operation_strategy() -> impl Strategy<Value = TxnOperation> {
    prop_oneof![
        3 => (key_strategy(), nonempty_value_strategy())
            .prop_map(|(key, value)| TxnOperation::Set { key, value }),
        1 => key_strategy().prop_map(|key| TxnOperation::Delete { key }),
        2 => key_strategy().prop_map(|key| TxnOperation::Get { key }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<TxnOperation>> {
    prop::collection::vec(txn_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siltkv_codec::{decode_key, encode_key};

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_values_encode(values in tuple_strategy(4)) {
            let encoded = encode_key(&values).unwrap();
            let decoded = decode_key(&encoded).unwrap();
            prop_assert_eq!(decoded.len(), values.len());
        }

        #[test]
        fn generated_sets_are_never_empty(op in txn_operation_strategy()) {
            if let TxnOperation::Set { value, .. } = op {
                prop_assert!(!value.is_empty());
            }
        }
    }
}
