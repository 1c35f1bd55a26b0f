//! Backend Module
//!
//! The flat property service the store is layered on.
//!
//! ## Contract
//! - One scalar per key, no hierarchy, no arrays
//! - Each scalar is capped at `value_size_limit()` bytes; larger writes fail
//! - Writes to a single key are atomic; nothing spans keys
//! - `keys()` enumerates every stored key
//!
//! ## Implementations
//! - `MemoryBackend`: in-process map (tests, embedding)
//! - `FileBackend`: same map persisted to a checksummed snapshot file
//! - `CachedBackend`: read-cache decorator over any backend

mod cache;
mod file;
mod memory;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{PropError, Result};

pub use cache::{CacheStats, CachedBackend};
pub use file::FileBackend;
pub use memory::MemoryBackend;

/// A single value as held by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// UTF-8 text (meta and link records are stored this way)
    Text(String),

    /// A number
    Number(f64),

    /// A boolean
    Bool(bool),

    /// Opaque bytes (chunk segments are stored this way; they may cut
    /// through a multi-byte character)
    Raw(Bytes),
}

impl Scalar {
    /// Size counted against the per-key ceiling
    pub fn byte_len(&self) -> usize {
        match self {
            Scalar::Text(s) => s.len(),
            Scalar::Number(_) => 8,
            Scalar::Bool(_) => 1,
            Scalar::Raw(b) => b.len(),
        }
    }

    /// Borrow the text payload, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A flat key → scalar store with a per-key size ceiling
pub trait PropertyBackend: Send + Sync {
    /// Read a key (`None` when absent)
    fn get(&self, key: &str) -> Result<Option<Scalar>>;

    /// Write a key, replacing any previous value
    fn set(&self, key: &str, value: Scalar) -> Result<()>;

    /// Remove a key (no-op when absent)
    fn delete(&self, key: &str) -> Result<()>;

    /// Every key currently stored
    fn keys(&self) -> Result<Vec<String>>;

    /// Aggregate bytes used by keys and values
    fn total_byte_usage(&self) -> Result<u64>;

    /// Largest scalar accepted by `set`
    fn value_size_limit(&self) -> usize;

    /// Keys starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

/// Reject a scalar above the ceiling
pub(crate) fn check_size(key: &str, value: &Scalar, limit: usize) -> Result<()> {
    let size = value.byte_len();
    if size > limit {
        return Err(PropError::ValueTooLarge {
            key: key.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Bytes a single entry contributes to `total_byte_usage`
pub(crate) fn entry_usage(key: &str, value: &Scalar) -> u64 {
    (key.len() + value.byte_len()) as u64
}

impl<B: PropertyBackend + ?Sized> PropertyBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<Scalar>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Scalar) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }

    fn total_byte_usage(&self) -> Result<u64> {
        (**self).total_byte_usage()
    }

    fn value_size_limit(&self) -> usize {
        (**self).value_size_limit()
    }
}
