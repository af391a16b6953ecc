//! CLI command implementations.

pub mod codec;
pub mod compact;
pub mod kv;
pub mod scan;
pub mod stats;

use siltkv_core::{Config, Store};
use std::path::Path;

/// Opens an existing store without creating one.
pub fn open_existing(path: &Path) -> Result<Store, Box<dyn std::error::Error>> {
    Ok(Store::open(path, Config::new().create_if_missing(false))?)
}
