//! Chunked scalar storage
//!
//! A value is serialized to JSON, split into `limit`-byte segments stored
//! under `K#chunk[i]`, and described by `{"kind":"value","chunks":n}` at
//! `K#meta`. The same machinery stores array slot values under their
//! `K#slot[s]` keys.

use bytes::Bytes;
use serde_json::Value;

use crate::backend::{PropertyBackend, Scalar};
use crate::codec;
use crate::error::{PropError, Result};
use crate::index::{Kind, Meta};
use crate::keys::{validate_key, SubKey};

use super::{mismatch, Store};

impl<B: PropertyBackend> Store<B> {
    /// Store `value` under `key`, replacing whatever the key held
    ///
    /// `Value::Null` removes the key. An array stored under `key` is
    /// dropped before the value is written.
    pub fn set_value(&self, key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;

        if value.is_null() {
            return self.delete(key);
        }

        let previous = match self.read_meta(key)? {
            Some(Meta::Value { chunks }) => chunks,
            Some(Meta::Array(_)) => {
                tracing::debug!(key, "replacing array with value");
                self.purge_array_data(key)?;
                0
            }
            None => 0,
        };

        let text = codec::serialize(value)?;
        self.write_chunked(key, text.as_bytes(), previous)
    }

    /// Read the value under `key`
    ///
    /// Returns `None` when the key is absent or its chunk set is incomplete.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        match self.read_meta(key)? {
            Some(Meta::Value { chunks }) => self.read_value(key, chunks),
            Some(Meta::Array(_)) => Err(mismatch(key, Kind::Value, Kind::Array)),
            None => Ok(None),
        }
    }

    /// Read the value under `key`, or `default` when there is none
    pub fn get_value(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Remove the value under `key` and all of its chunks
    ///
    /// Dropping an absent key is a no-op.
    pub fn drop_value(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match self.read_meta(key)? {
            Some(Meta::Value { chunks }) => {
                tracing::debug!(key, chunks, "drop value");
                self.drop_chunked(key, chunks)
            }
            Some(Meta::Array(_)) => Err(mismatch(key, Kind::Value, Kind::Array)),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Chunk Helpers (shared with array slots)
    // =========================================================================

    /// Write `bytes` as chunks of `key`, then its meta, then delete any
    /// chunks beyond the new count left over from a larger value
    pub(crate) fn write_chunked(&self, key: &str, bytes: &[u8], previous: usize) -> Result<()> {
        if self.limit == 0 {
            return Err(PropError::Config(
                "value_size_limit must be at least 1 byte".to_string(),
            ));
        }
        let segments = codec::split(bytes, self.limit);
        let chunks = segments.len();

        for (i, segment) in segments.into_iter().enumerate() {
            self.backend
                .set(&self.physical(key, SubKey::Chunk(i)), Scalar::Raw(segment))?;
        }

        self.write_meta(key, &Meta::Value { chunks })?;

        for i in chunks..previous {
            self.backend.delete(&self.physical(key, SubKey::Chunk(i)))?;
        }

        tracing::debug!(key, bytes = bytes.len(), chunks, previous, "wrote chunked value");
        Ok(())
    }

    /// Join the `chunks` segments of `key`
    ///
    /// A missing segment means a partially written or partially deleted
    /// value; that reads as absent rather than as a fault.
    pub(crate) fn read_chunked(&self, key: &str, chunks: usize) -> Result<Option<Bytes>> {
        let mut segments = Vec::with_capacity(chunks);

        for i in 0..chunks {
            let chunk_key = self.physical(key, SubKey::Chunk(i));
            match self.backend.get(&chunk_key)? {
                Some(Scalar::Raw(bytes)) => segments.push(bytes),
                Some(Scalar::Text(text)) => segments.push(Bytes::from(text)),
                Some(other) => {
                    tracing::warn!(key = %chunk_key, ?other, "unexpected chunk scalar");
                    return Ok(None);
                }
                None => {
                    tracing::warn!(key, missing = i, chunks, "incomplete chunk set");
                    return Ok(None);
                }
            }
        }

        Ok(Some(codec::join(&segments)))
    }

    /// Read and decode a chunked value
    pub(crate) fn read_value(&self, key: &str, chunks: usize) -> Result<Option<Value>> {
        let Some(bytes) = self.read_chunked(key, chunks)? else {
            return Ok(None);
        };

        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(Some(codec::deserialize(text))),
            Err(e) => {
                tracing::warn!(key, error = %e, "chunked value is not UTF-8");
                Ok(None)
            }
        }
    }

    /// Read the value of an internal chunked key, checking its meta first
    pub(crate) fn read_nested_value(&self, key: &str) -> Result<Option<Value>> {
        match self.read_meta(key)? {
            Some(Meta::Value { chunks }) => self.read_value(key, chunks),
            Some(Meta::Array(_)) => Err(mismatch(key, Kind::Value, Kind::Array)),
            None => Ok(None),
        }
    }

    /// Write a value to an internal chunked key, replacing a previous one
    pub(crate) fn write_nested_value(&self, key: &str, value: &Value) -> Result<()> {
        let previous = match self.read_meta(key)? {
            Some(Meta::Value { chunks }) => chunks,
            _ => 0,
        };
        let text = codec::serialize(value)?;
        self.write_chunked(key, text.as_bytes(), previous)
    }

    /// Delete the chunks of `key`, then its meta
    pub(crate) fn drop_chunked(&self, key: &str, chunks: usize) -> Result<()> {
        for i in 0..chunks {
            self.backend.delete(&self.physical(key, SubKey::Chunk(i)))?;
        }
        self.delete_meta(key)
    }
}
