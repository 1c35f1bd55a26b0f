//! # PropKV
//!
//! Structured values on top of a flat, size-capped property store:
//! - Transparent chunking of values larger than the per-key byte ceiling
//! - Sparse doubly-linked arrays with push/pop at both ends
//! - Cursor-based traversal and splicing without rewriting the collection
//! - Prefix namespacing and an optional read-cache decorator
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                                │
//! │              (dispatch on the K#meta record)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │   Chunked   │          │ Linked Array │◄──── Cursor
//!   │   Scalars   │          │ (K#link[s])  │
//!   └──────┬──────┘          └──────┬───────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────────┐
//!   │          PropertyBackend                │
//!   │   (Memory / File, optionally Cached)    │
//!   └─────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod keys;
pub mod backend;
pub mod codec;
pub mod index;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PropError, Result};
pub use config::Config;
pub use backend::{CachedBackend, FileBackend, MemoryBackend, PropertyBackend, Scalar};
pub use index::{ArrayIndex, Kind, Link};
pub use store::{Cursor, DynStore, Store};

/// Logical values handled by the store
pub use serde_json::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of PropKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
