//! Codec Module
//!
//! Turns logical values into backend-sized pieces and back.
//!
//! - `chunk`: byte-exact split/join against the per-key ceiling
//! - `value`: JSON serialization of logical values

mod chunk;
mod value;

pub use chunk::{chunk_count, join, split};
pub use value::{deserialize, serialize};
