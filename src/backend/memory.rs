//! In-memory backend
//!
//! BTreeMap-based property store with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::config::DEFAULT_VALUE_SIZE_LIMIT;
use crate::error::Result;

use super::{check_size, entry_usage, PropertyBackend, Scalar};

/// Property store held entirely in process memory
pub struct MemoryBackend {
    data: RwLock<BTreeMap<String, Scalar>>,
    limit: usize,
}

impl MemoryBackend {
    /// Create an empty backend with the default 32,767-byte ceiling
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_VALUE_SIZE_LIMIT)
    }

    /// Create an empty backend with a custom ceiling
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            limit,
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Scalar>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Scalar) -> Result<()> {
        check_size(key, &value, self.limit)?;
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.read().keys().cloned().collect())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let data = self.data.read();
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn total_byte_usage(&self) -> Result<u64> {
        Ok(self.data.read().iter().map(|(k, v)| entry_usage(k, v)).sum())
    }

    fn value_size_limit(&self) -> usize {
        self.limit
    }
}
