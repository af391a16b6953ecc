//! Helpers for prefix-partitioned key spaces.
//!
//! Upper layers partition the key space by prefixing every key with a fixed
//! string (`"m_"` for metadata, a table prefix for rows, and so on). These
//! helpers walk or clear one partition inside a transaction.

use crate::error::{CoreError, CoreResult};
use crate::transaction::Transaction;
use siltkv_codec::{decode_key, encode_key, Value};
use siltkv_storage::EngineIterator;
use tracing::debug;

/// Visits every `(key, value)` under `prefix` in key order while `f`
/// returns true.
///
/// # Errors
///
/// Returns an error if the transaction is closed or the engine fails.
pub fn scan_with_prefix<F>(txn: &Transaction, prefix: &[u8], mut f: F) -> CoreResult<()>
where
    F: FnMut(&[u8], &[u8]) -> bool,
{
    let mut iter = txn.scan_prefix(prefix)?;
    while iter.valid() {
        if !f(iter.key(), iter.value()) {
            break;
        }
        iter.next()?;
    }
    Ok(())
}

/// Stages a delete for every key under `prefix` and returns how many keys
/// were found.
///
/// # Errors
///
/// Returns an error if the transaction is closed or the engine fails.
pub fn delete_with_prefix(txn: &mut Transaction, prefix: &[u8]) -> CoreResult<usize> {
    debug!(txn = %txn.id(), prefix = ?prefix, "delete with prefix");
    let mut keys = Vec::new();
    scan_with_prefix(txn, prefix, |key, _| {
        keys.push(key.to_vec());
        true
    })?;
    for key in &keys {
        txn.delete(key)?;
    }
    Ok(keys.len())
}

/// Builds the key of a row (`column_id == None`) or one of its columns.
///
/// # Errors
///
/// Never fails for the value kinds used here; the codec error is passed on
/// for completeness.
pub fn encode_record_key(
    table_prefix: &str,
    handle: i64,
    column_id: Option<i64>,
) -> CoreResult<Vec<u8>> {
    let mut values = vec![Value::from(table_prefix), Value::Int(handle)];
    if let Some(column_id) = column_id {
        values.push(Value::Int(column_id));
    }
    Ok(encode_key(&values)?)
}

/// Extracts the row handle from a key built by [`encode_record_key`].
///
/// # Errors
///
/// Returns a codec error for malformed keys and
/// [`CoreError::InvalidArgument`] if the second field is not an integer.
pub fn decode_record_handle(key: &[u8]) -> CoreResult<i64> {
    decode_key(key)?
        .get(1)
        .and_then(Value::as_int)
        .ok_or_else(|| CoreError::invalid_argument("record key has no integer handle"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn seeded() -> Store {
        let store = Store::open_in_memory();
        let mut txn = store.begin().unwrap();
        for key in ["m_a", "m_b", "m_c", "n_a"] {
            txn.set(key.as_bytes(), key.as_bytes()).unwrap();
        }
        txn.commit().unwrap();
        store
    }

    #[test]
    fn scan_visits_prefix_only() {
        let store = seeded();
        let txn = store.begin().unwrap();
        let mut seen = Vec::new();
        scan_with_prefix(&txn, b"m_", |k, v| {
            assert_eq!(k, v);
            seen.push(String::from_utf8(k.to_vec()).unwrap());
            true
        })
        .unwrap();
        assert_eq!(seen, vec!["m_a", "m_b", "m_c"]);
    }

    #[test]
    fn scan_stops_when_callback_declines() {
        let store = seeded();
        let txn = store.begin().unwrap();
        let mut count = 0;
        scan_with_prefix(&txn, b"m_", |_, _| {
            count += 1;
            count < 2
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn delete_with_prefix_clears_partition() {
        let store = seeded();
        let mut txn = store.begin().unwrap();
        assert_eq!(delete_with_prefix(&mut txn, b"m_").unwrap(), 3);
        txn.commit().unwrap();

        let mut txn = store.begin().unwrap();
        assert!(txn.get(b"m_b").unwrap_err().is_not_found());
        assert_eq!(txn.get(b"n_a").unwrap(), b"n_a");
        assert_eq!(delete_with_prefix(&mut txn, b"m_").unwrap(), 0);
    }

    #[test]
    fn record_keys_group_by_handle() {
        let row = encode_record_key("t_1", 7, None).unwrap();
        let col = encode_record_key("t_1", 7, Some(2)).unwrap();
        let next_row = encode_record_key("t_1", 8, None).unwrap();
        assert!(col.starts_with(&row));
        assert!(col < next_row);
        assert_eq!(decode_record_handle(&col).unwrap(), 7);
        assert!(decode_record_handle(&encode_key(&[Value::from("x")]).unwrap()).is_err());
    }
}
