//! Error types for PropKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::index::Kind;

/// Result type alias using PropError
pub type Result<T> = std::result::Result<T, PropError>;

/// Unified error type for PropKV operations
///
/// Boundary conditions (popping an empty array, walking past the tail) are
/// not errors; those operations return `Ok(None)`.
#[derive(Debug, Error)]
pub enum PropError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Shape Errors
    // -------------------------------------------------------------------------
    #[error("Shape mismatch on '{key}': expected {expected}, found {found}")]
    ShapeMismatch {
        key: String,
        expected: Kind,
        found: Kind,
    },

    #[error("Stale cursor: slot {slot} of '{key}' was removed")]
    StaleCursor { key: String, slot: i64 },

    #[error("Corrupt record at '{key}': {reason}")]
    CorruptRecord { key: String, reason: String },

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Value too large for '{key}': {size} bytes (limit {limit})")]
    ValueTooLarge {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PropError {
    fn from(e: serde_json::Error) -> Self {
        PropError::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for PropError {
    fn from(e: bincode::Error) -> Self {
        PropError::Serialization(e.to_string())
    }
}
