//! Chunk codec
//!
//! Splits an encoded value into segments of at most `limit` bytes and joins
//! them back together.
//!
//! Segments are raw byte slices, never character slices: a segment boundary
//! may fall inside a multi-byte UTF-8 sequence, and `join` restores it
//! exactly because it concatenates bytes before any decoding happens.

use bytes::{Bytes, BytesMut};

/// Number of segments `split` produces for `len` bytes
pub fn chunk_count(len: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    len.div_ceil(limit)
}

/// Cut `bytes` into `limit`-sized segments; the last one holds the remainder
///
/// An empty input yields no segments, and an exact multiple of `limit`
/// yields no trailing empty segment.
///
/// # Panics
///
/// Panics if `limit` is 0.
pub fn split(bytes: &[u8], limit: usize) -> Vec<Bytes> {
    assert!(limit > 0, "chunk limit must be at least 1 byte");

    let shared = Bytes::copy_from_slice(bytes);
    let mut segments = Vec::with_capacity(chunk_count(bytes.len(), limit));
    let mut offset = 0;

    while offset < shared.len() {
        let end = (offset + limit).min(shared.len());
        segments.push(shared.slice(offset..end));
        offset = end;
    }

    segments
}

/// Concatenate segments in order
pub fn join<S: AsRef<[u8]>>(segments: &[S]) -> Bytes {
    let total = segments.iter().map(|s| s.as_ref().len()).sum();
    let mut buf = BytesMut::with_capacity(total);
    for segment in segments {
        buf.extend_from_slice(segment.as_ref());
    }
    buf.freeze()
}
