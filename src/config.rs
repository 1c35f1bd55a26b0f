//! Configuration for PropKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{PropError, Result};

/// Per-key byte ceiling of the reference property service
pub const DEFAULT_VALUE_SIZE_LIMIT: usize = 32_767;

/// Main configuration for a PropKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Backend Configuration
    // -------------------------------------------------------------------------
    /// Largest scalar (in bytes) a single physical key may hold.
    /// Chunk segments are cut to exactly this size.
    pub value_size_limit: usize,

    /// Snapshot file used by the file backend
    pub data_path: PathBuf,

    /// Wrap the backend in a read cache when opening from a file
    pub read_cache: bool,

    // -------------------------------------------------------------------------
    // Key Configuration
    // -------------------------------------------------------------------------
    /// Root namespace prefix applied to every physical key ("" for none)
    pub namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            value_size_limit: DEFAULT_VALUE_SIZE_LIMIT,
            data_path: PathBuf::from("./propkv.db"),
            read_cache: false,
            namespace: String::new(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.value_size_limit == 0 {
            return Err(PropError::Config(
                "value_size_limit must be at least 1 byte".to_string(),
            ));
        }
        if self.namespace.contains(crate::keys::SEPARATOR) {
            return Err(PropError::Config(format!(
                "namespace '{}' contains reserved character '{}'",
                self.namespace,
                crate::keys::SEPARATOR
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the per-key byte ceiling
    pub fn value_size_limit(mut self, limit: usize) -> Self {
        self.config.value_size_limit = limit;
        self
    }

    /// Set the snapshot file path
    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_path = path.into();
        self
    }

    /// Enable or disable the read cache
    pub fn read_cache(mut self, enabled: bool) -> Self {
        self.config.read_cache = enabled;
        self
    }

    /// Set the root namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
