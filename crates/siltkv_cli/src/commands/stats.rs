//! Stats command implementation.

use serde::Serialize;
use siltkv_storage::log::LOG_VERSION;
use siltkv_storage::{FileEngine, FileEngineOptions};
use std::path::Path;

/// Store metadata, for output.
#[derive(Debug, Serialize)]
pub struct StoreInfo {
    /// Store directory.
    pub path: String,
    /// Log format version written by this build.
    pub format_version: u16,
    /// Number of live keys.
    pub keys: usize,
    /// Size of the data log in bytes.
    pub log_bytes: u64,
}

/// Runs the stats command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let info = gather(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        _ => {
            println!("Store: {}", info.path);
            println!("  Format version: {}", info.format_version);
            println!("  Live keys:      {}", info.keys);
            println!("  Log size:       {} bytes", info.log_bytes);
        }
    }

    Ok(())
}

fn gather(path: &Path) -> Result<StoreInfo, Box<dyn std::error::Error>> {
    let options = FileEngineOptions {
        create_if_missing: false,
        ..FileEngineOptions::default()
    };
    let engine = FileEngine::open(path, options)?;
    Ok(StoreInfo {
        path: path.display().to_string(),
        format_version: LOG_VERSION,
        keys: engine.len(),
        log_bytes: engine.log_size(),
    })
}
