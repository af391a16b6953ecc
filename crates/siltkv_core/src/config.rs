//! Store configuration.

use siltkv_storage::FileEngineOptions;

/// Configuration for opening an on-disk store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the store already holds data.
    pub error_if_exists: bool,

    /// Whether to sync the log on every commit (safer but slower).
    pub sync_on_commit: bool,

    /// Whether to rewrite the log with only live entries when opening.
    pub compact_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            sync_on_commit: true,
            compact_on_open: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the store exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Sets whether to sync the log on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets whether to compact the log when opening.
    #[must_use]
    pub const fn compact_on_open(mut self, value: bool) -> Self {
        self.compact_on_open = value;
        self
    }

    /// Engine options matching this configuration.
    #[must_use]
    pub fn engine_options(&self) -> FileEngineOptions {
        FileEngineOptions {
            create_if_missing: self.create_if_missing,
            error_if_exists: self.error_if_exists,
            sync_on_commit: self.sync_on_commit,
            compact_on_open: self.compact_on_open,
        }
    }
}
