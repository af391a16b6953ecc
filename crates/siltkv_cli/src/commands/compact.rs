//! Compact command implementation.

use siltkv_storage::{FileEngine, FileEngineOptions, StorageEngine};
use std::path::Path;
use tracing::info;

/// Compaction statistics.
#[derive(Debug)]
pub struct CompactStats {
    /// Live keys written to the new log.
    pub live_keys: usize,
    /// Bytes before compaction.
    pub bytes_before: u64,
    /// Bytes after compaction.
    pub bytes_after: u64,
}

/// Runs the compact command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Compacting store at {:?}", path);
    println!();

    let stats = compact(path)?;
    let saved = stats.bytes_before.saturating_sub(stats.bytes_after);

    println!("Compaction Result:");
    println!("  Live keys:   {}", stats.live_keys);
    println!("  Size before: {} bytes", stats.bytes_before);
    println!("  Size after:  {} bytes", stats.bytes_after);
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        saved,
        if stats.bytes_before > 0 {
            (saved as f64 / stats.bytes_before as f64) * 100.0
        } else {
            0.0
        }
    );

    Ok(())
}

fn compact(path: &Path) -> Result<CompactStats, Box<dyn std::error::Error>> {
    let options = FileEngineOptions {
        create_if_missing: false,
        ..FileEngineOptions::default()
    };
    let engine = FileEngine::open(path, options)?;
    let bytes_before = engine.log_size();
    engine.compact()?;
    let stats = CompactStats {
        live_keys: engine.len(),
        bytes_before,
        bytes_after: engine.log_size(),
    };
    engine.close()?;
    info!("Compacted {:?}", path);
    Ok(stats)
}
