//! Scan command implementation.

use serde::Serialize;
use siltkv_core::EngineIterator;
use std::path::Path;

/// One scanned entry, for output.
#[derive(Debug, Serialize)]
pub struct EntryInfo {
    /// Key, lossily decoded as UTF-8.
    pub key: String,
    /// Value, lossily decoded as UTF-8.
    pub value: String,
}

/// Runs the scan command.
pub fn run(
    path: &Path,
    prefix: &str,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = collect(path, prefix, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            for entry in &entries {
                println!("{}\t{}", entry.key, entry.value);
            }
            println!();
            println!("{} entries", entries.len());
        }
    }

    Ok(())
}

fn collect(
    path: &Path,
    prefix: &str,
    limit: Option<usize>,
) -> Result<Vec<EntryInfo>, Box<dyn std::error::Error>> {
    let store = super::open_existing(path)?;
    let txn = store.begin()?;
    let mut iter = txn.scan_prefix(prefix.as_bytes())?;
    let max = limit.unwrap_or(usize::MAX);

    let mut entries = Vec::new();
    while iter.valid() && entries.len() < max {
        entries.push(EntryInfo {
            key: String::from_utf8_lossy(iter.key()).into_owned(),
            value: String::from_utf8_lossy(iter.value()).into_owned(),
        });
        iter.next()?;
    }
    Ok(entries)
}
