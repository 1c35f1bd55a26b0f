//! Store Module
//!
//! The façade that turns logical keys into physical sub-key reads and writes.
//!
//! ## Responsibilities
//! - Dispatch on the `K#meta` record (value, array, or absent)
//! - Keep a key in exactly one shape: whole-value writes replace the other shape
//! - Apply the namespace prefix to every derived sub-key
//!
//! ## Write Ordering
//! No backend write spans keys, so every multi-key mutation writes its data
//! keys (chunks, slot values, neighbor links) first and the `K#meta` record
//! last. Until the header lands, readers still see the previous valid state.
//! A crash in between can leave orphaned chunks or links, never a header
//! that describes data which was not yet written.

mod array;
mod cursor;
mod scalar;

use std::sync::Arc;

use crate::backend::{CachedBackend, FileBackend, PropertyBackend};
use crate::config::Config;
use crate::error::{PropError, Result};
use crate::index::{Kind, Meta};
use crate::keys::{validate_key, Namespace, SubKey};

pub use cursor::Cursor;

/// A store opened from a `Config`, backend chosen at runtime
pub type DynStore = Store<Box<dyn PropertyBackend>>;

/// Structured values over a flat property backend
///
/// Cloning is cheap: clones (and sub-stores) share the same backend.
pub struct Store<B> {
    /// Physical storage, shared with sub-stores
    backend: Arc<B>,

    /// Prefix applied to every physical key
    namespace: Namespace,

    /// Chunk size used when splitting values
    limit: usize,
}

impl<B> Clone for Store<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            namespace: self.namespace.clone(),
            limit: self.limit,
        }
    }
}

impl<B: PropertyBackend> Store<B> {
    /// Wrap a backend using its own ceiling and the root namespace
    pub fn new(backend: B) -> Self {
        let limit = backend.value_size_limit();
        Self {
            backend: Arc::new(backend),
            namespace: Namespace::root(),
            limit,
        }
    }

    /// Wrap a backend with an explicit config
    ///
    /// The chunk size is the smaller of the configured and the backend limit.
    pub fn with_config(backend: B, config: &Config) -> Result<Self> {
        config.validate()?;
        let limit = config.value_size_limit.min(backend.value_size_limit());
        Ok(Self {
            backend: Arc::new(backend),
            namespace: Namespace::from_path(&config.namespace)?,
            limit,
        })
    }

    /// A store isolated under `name` inside this store's namespace
    pub fn sub(&self, name: &str) -> Result<Self> {
        Ok(Self {
            backend: Arc::clone(&self.backend),
            namespace: self.namespace.child(name)?,
            limit: self.limit,
        })
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// What `key` currently holds, if anything
    pub fn kind(&self, key: &str) -> Result<Option<Kind>> {
        validate_key(key)?;
        Ok(self.read_meta(key)?.map(|meta| meta.kind()))
    }

    /// Whether `key` holds a value or an array
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.kind(key)?.is_some())
    }

    /// Remove `key` whatever shape it has
    pub fn delete(&self, key: &str) -> Result<()> {
        match self.kind(key)? {
            Some(Kind::Value) => self.drop_value(key),
            Some(Kind::Array) => self.drop_array(key),
            None => Ok(()),
        }
    }

    /// Logical keys stored directly in this namespace
    pub fn keys(&self) -> Result<Vec<String>> {
        let physical = self.backend.keys_with_prefix(self.namespace.prefix())?;
        Ok(physical
            .iter()
            .filter_map(|k| self.namespace.logical_from_meta(k))
            .map(str::to_string)
            .collect())
    }

    /// Every physical key owned by `key`
    pub fn physical_keys(&self, key: &str) -> Result<Vec<String>> {
        validate_key(key)?;
        self.backend
            .keys_with_prefix(&self.namespace.owned_prefix(key))
    }

    /// Aggregate byte usage reported by the backend
    pub fn usage(&self) -> Result<u64> {
        self.backend.total_byte_usage()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Chunk size in bytes
    pub fn value_size_limit(&self) -> usize {
        self.limit
    }

    // =========================================================================
    // Meta Helpers
    // =========================================================================

    fn physical(&self, key: &str, sub: SubKey) -> String {
        self.namespace.physical(key, sub)
    }

    pub(crate) fn read_meta(&self, key: &str) -> Result<Option<Meta>> {
        let meta_key = self.physical(key, SubKey::Meta);
        match self.backend.get(&meta_key)? {
            Some(scalar) => Ok(Some(Meta::decode(&meta_key, &scalar)?)),
            None => Ok(None),
        }
    }

    fn write_meta(&self, key: &str, meta: &Meta) -> Result<()> {
        let meta_key = self.physical(key, SubKey::Meta);
        tracing::trace!(key = %meta_key, ?meta, "write meta");
        self.backend.set(&meta_key, meta.encode()?)
    }

    fn delete_meta(&self, key: &str) -> Result<()> {
        self.backend.delete(&self.physical(key, SubKey::Meta))
    }
}

impl DynStore {
    /// Open a file-backed store, optionally behind a read cache
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let file = FileBackend::open(&config.data_path, config.value_size_limit)?;

        let backend: Box<dyn PropertyBackend> = if config.read_cache {
            Box::new(CachedBackend::new(file))
        } else {
            Box::new(file)
        };

        tracing::info!(
            path = %config.data_path.display(),
            limit = config.value_size_limit,
            cache = config.read_cache,
            "store opened"
        );
        Self::with_config(backend, config)
    }
}

/// Shape mismatch error for `key`
fn mismatch(key: &str, expected: Kind, found: Kind) -> PropError {
    PropError::ShapeMismatch {
        key: key.to_string(),
        expected,
        found,
    }
}
