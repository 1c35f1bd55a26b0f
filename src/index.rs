//! Index records
//!
//! Every logical key that exists has exactly one `#meta` record, which says
//! what the key holds:
//!
//! ```text
//! {"kind":"value","chunks":3}
//! {"kind":"array","low":-1,"high":2,"head":-1,"tail":2}
//! ```
//!
//! Arrays additionally keep one link record per live slot under `#link[s]`:
//!
//! ```text
//! {"prev":-1,"next":2}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::Scalar;
use crate::error::{PropError, Result};

/// What a logical key holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A chunked scalar or object
    Value,
    /// A sparse linked array
    Array,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Value => write!(f, "value"),
            Kind::Array => write!(f, "array"),
        }
    }
}

// =============================================================================
// Meta Record
// =============================================================================

/// The discriminator record stored under `K#meta`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Meta {
    /// Value Index: the value occupies `K#chunk[0..chunks]`
    Value { chunks: usize },

    /// Array header
    Array(ArrayHeader),
}

impl Meta {
    pub fn kind(&self) -> Kind {
        match self {
            Meta::Value { .. } => Kind::Value,
            Meta::Array(_) => Kind::Array,
        }
    }

    pub fn encode(&self) -> Result<Scalar> {
        Ok(Scalar::Text(serde_json::to_string(self)?))
    }

    pub fn decode(key: &str, scalar: &Scalar) -> Result<Self> {
        decode_record(key, scalar)
    }
}

/// Header of a linked array
///
/// `low`/`high` bound every slot ever allocated since the array was created.
/// An empty array has `low == high` and no head or tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayHeader {
    pub low: i64,
    pub high: i64,
    pub head: Option<i64>,
    pub tail: Option<i64>,
}

impl ArrayHeader {
    /// The Empty-state sentinel of a new array
    pub fn empty() -> Self {
        Self::empty_at(0)
    }

    /// An empty sentinel whose next slot is `slot`
    pub fn empty_at(slot: i64) -> Self {
        Self {
            low: slot,
            high: slot,
            head: None,
            tail: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl Default for ArrayHeader {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Link Record
// =============================================================================

/// Neighbors of one live slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Link {
    pub prev: Option<i64>,
    pub next: Option<i64>,
}

impl Link {
    pub fn new(prev: Option<i64>, next: Option<i64>) -> Self {
        Self { prev, next }
    }

    pub fn encode(&self) -> Result<Scalar> {
        Ok(Scalar::Text(serde_json::to_string(self)?))
    }

    pub fn decode(key: &str, scalar: &Scalar) -> Result<Self> {
        decode_record(key, scalar)
    }
}

fn decode_record<T: serde::de::DeserializeOwned>(key: &str, scalar: &Scalar) -> Result<T> {
    let text = scalar.as_text().ok_or_else(|| PropError::CorruptRecord {
        key: key.to_string(),
        reason: "record is not text".to_string(),
    })?;
    serde_json::from_str(text).map_err(|e| PropError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Array Index
// =============================================================================

/// A materialized view of one array: its bounds and every live link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayIndex {
    pub low: i64,
    pub high: i64,
    pub links: BTreeMap<i64, Link>,
}

impl ArrayIndex {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// The unique slot with no predecessor
    pub fn head(&self) -> Option<i64> {
        self.links
            .iter()
            .find(|(_, link)| link.prev.is_none())
            .map(|(slot, _)| *slot)
    }

    /// The unique slot with no successor
    pub fn tail(&self) -> Option<i64> {
        self.links
            .iter()
            .find(|(_, link)| link.next.is_none())
            .map(|(slot, _)| *slot)
    }

    /// Slots in head → tail order
    pub fn forward(&self) -> Vec<i64> {
        self.walk(self.head(), |link| link.next)
    }

    /// Slots in tail → head order
    pub fn backward(&self) -> Vec<i64> {
        self.walk(self.tail(), |link| link.prev)
    }

    fn walk(&self, start: Option<i64>, step: impl Fn(&Link) -> Option<i64>) -> Vec<i64> {
        let mut slots = Vec::with_capacity(self.links.len());
        let mut current = start;
        while let Some(slot) = current {
            // Bail out on cycles instead of looping forever
            if slots.len() > self.links.len() {
                break;
            }
            slots.push(slot);
            current = self.links.get(&slot).and_then(&step);
        }
        slots
    }

    /// True when the links form exactly one doubly linked chain within bounds
    pub fn is_consistent(&self) -> bool {
        if self.links.keys().any(|s| *s < self.low || *s > self.high) {
            return false;
        }

        let heads = self.links.values().filter(|l| l.prev.is_none()).count();
        let tails = self.links.values().filter(|l| l.next.is_none()).count();
        if self.links.is_empty() {
            return heads == 0 && tails == 0;
        }
        if heads != 1 || tails != 1 {
            return false;
        }

        let forward = self.forward();
        let mut backward = self.backward();
        backward.reverse();

        forward.len() == self.links.len() && forward == backward
    }
}
