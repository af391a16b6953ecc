//! Single-key transaction commands.

use siltkv_core::{Config, Store};
use std::path::Path;
use tracing::info;

/// Prints the value under `key`.
pub fn get(path: &Path, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(path)?;
    let mut txn = store.begin()?;
    match txn.get(key.as_bytes()) {
        Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
        Err(e) if e.is_not_found() => return Err(format!("key {key:?} not found").into()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Stores `value` under `key`.
pub fn put(path: &Path, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path, Config::default())?;
    let mut txn = store.begin()?;
    txn.set(key.as_bytes(), value.as_bytes())?;
    txn.commit()?;
    info!("Stored {:?} ({} bytes)", key, value.len());
    Ok(())
}

/// Deletes `key`; deleting a missing key is not an error.
pub fn delete(path: &Path, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_existing(path)?;
    let mut txn = store.begin()?;
    txn.delete(key.as_bytes())?;
    txn.commit()?;
    info!("Deleted {:?}", key);
    Ok(())
}

/// Adds `step` to the counter under `key` and prints the result.
pub fn inc(path: &Path, key: &str, step: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(path, Config::default())?;
    let mut txn = store.begin()?;
    let value = txn.inc(key.as_bytes(), step)?;
    txn.commit()?;
    println!("{value}");
    Ok(())
}
