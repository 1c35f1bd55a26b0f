//! Read-cache decorator
//!
//! Mirrors `get`/`set`/`delete` of an inner backend with a local map.
//!
//! Invalidation is always by exact physical key: a single logical store
//! operation can touch many physical keys, and each of those writes passes
//! through here individually. Only present values are cached: a delete
//! evicts its key and a miss on an absent key stores nothing, so the cache
//! never holds more entries than the inner backend holds keys.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::Result;

use super::{PropertyBackend, Scalar};

/// Hit/miss counters of a `CachedBackend`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Backend wrapper serving repeated reads from memory
pub struct CachedBackend<B> {
    inner: B,
    cache: Mutex<HashMap<String, Scalar>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<B: PropertyBackend> CachedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The wrapped backend
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Drop every cached entry
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.lock().len(),
        }
    }
}

impl<B: PropertyBackend> PropertyBackend for CachedBackend<B> {
    fn get(&self, key: &str) -> Result<Option<Scalar>> {
        if let Some(cached) = self.cache.lock().get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(cached.clone()));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = self.inner.get(key)?;
        if let Some(found) = &value {
            self.cache.lock().insert(key.to_string(), found.clone());
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: Scalar) -> Result<()> {
        // Invalidate first so a failed write never leaves a stale entry
        self.cache.lock().remove(key);
        self.inner.set(key, value.clone())?;
        self.cache.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.cache.lock().remove(key);
        self.inner.delete(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.keys_with_prefix(prefix)
    }

    fn total_byte_usage(&self) -> Result<u64> {
        self.inner.total_byte_usage()
    }

    fn value_size_limit(&self) -> usize {
        self.inner.value_size_limit()
    }
}
