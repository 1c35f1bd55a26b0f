//! Sparse linked arrays
//!
//! An array stores each element at an integer slot. Slots are linked into a
//! single doubly linked chain by per-slot link records, and the header in
//! `K#meta` keeps the chain ends plus the lowest and highest slot allocated.
//!
//! ## States
//! ```text
//! Absent ──create/push──► Empty ──push──► Populated
//!    ▲                      ▲                 │
//!    └────── drop ──────────┴── last removal ─┘
//! ```
//!
//! ## Slot Allocation
//! New slots are always taken outside the current bounds: `high + 1` when
//! appending or inserting after, `low - 1` when prepending or inserting
//! before. Interior holes left by removals are never refilled, so a slot
//! number is never reused. When the last element goes, the header becomes
//! an empty sentinel with `low == high == old_high + 1`, so the next push
//! lands on a slot that was never allocated.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::backend::PropertyBackend;
use crate::error::{PropError, Result};
use crate::index::{ArrayHeader, ArrayIndex, Kind, Link, Meta};
use crate::keys::{slot_key, validate_key, SubKey};

use super::{mismatch, Cursor, Store};

/// Which side of an existing slot a new slot is spliced in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

impl<B: PropertyBackend> Store<B> {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Make `key` an empty array
    ///
    /// An existing array is left untouched; an existing value is replaced.
    pub fn create_array(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match self.read_meta(key)? {
            Some(Meta::Array(_)) => Ok(()),
            Some(Meta::Value { chunks }) => {
                tracing::debug!(key, "replacing value with array");
                for i in 0..chunks {
                    self.backend.delete(&self.physical(key, SubKey::Chunk(i)))?;
                }
                self.write_meta(key, &Meta::Array(ArrayHeader::empty()))
            }
            None => self.write_meta(key, &Meta::Array(ArrayHeader::empty())),
        }
    }

    /// Remove the array under `key` with all of its elements
    pub fn drop_array(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match self.read_meta(key)? {
            Some(Meta::Array(_)) => {
                tracing::debug!(key, "drop array");
                self.purge_array_data(key)?;
                self.delete_meta(key)
            }
            Some(Meta::Value { .. }) => Err(mismatch(key, Kind::Array, Kind::Value)),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Ends
    // =========================================================================

    /// Append `value`, returning the slot it was stored at
    pub fn push_right(&self, key: &str, value: &Value) -> Result<i64> {
        validate_key(key)?;
        let header = self.header_or_empty(key)?;
        match header.tail {
            Some(tail) => self.splice(key, header, tail, Side::After, value),
            None => self.push_first(key, header, value),
        }
    }

    /// Prepend `value`, returning the slot it was stored at
    pub fn push_left(&self, key: &str, value: &Value) -> Result<i64> {
        validate_key(key)?;
        let header = self.header_or_empty(key)?;
        match header.head {
            Some(head) => self.splice(key, header, head, Side::Before, value),
            None => self.push_first(key, header, value),
        }
    }

    /// Remove and return the last element (`None` when empty or absent)
    pub fn pop_right(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        match self.read_header(key)?.and_then(|h| h.tail) {
            Some(tail) => self.remove_slot(key, tail).map(Some),
            None => Ok(None),
        }
    }

    /// Remove and return the first element (`None` when empty or absent)
    pub fn pop_left(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        match self.read_header(key)?.and_then(|h| h.head) {
            Some(head) => self.remove_slot(key, head).map(Some),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of elements, counted by walking the chain (0 when absent)
    pub fn length(&self, key: &str) -> Result<usize> {
        validate_key(key)?;
        let Some(header) = self.read_header(key)? else {
            return Ok(0);
        };
        Ok(self.walk_slots(key, header.head)?.len())
    }

    /// Elements in head → tail order (empty when absent)
    pub fn to_vec(&self, key: &str) -> Result<Vec<Value>> {
        validate_key(key)?;
        let Some(header) = self.read_header(key)? else {
            return Ok(Vec::new());
        };

        let mut values = Vec::new();
        for slot in self.walk_slots(key, header.head)? {
            let value = self.read_nested_value(&slot_key(key, slot))?;
            values.push(value.unwrap_or(Value::Null));
        }
        Ok(values)
    }

    /// Header bounds plus every link record persisted for `key`
    ///
    /// Links are collected by scanning the backend, not by walking, so the
    /// result shows orphaned or unreachable links too.
    pub fn array_index(&self, key: &str) -> Result<Option<ArrayIndex>> {
        validate_key(key)?;
        let Some(header) = self.read_header(key)? else {
            return Ok(None);
        };

        let mut links = BTreeMap::new();
        for physical in self.physical_keys(key)? {
            if let Some(slot) = self.parse_link_slot(key, &physical) {
                if let Some(link) = self.read_link(key, slot)? {
                    links.insert(slot, link);
                }
            }
        }

        Ok(Some(ArrayIndex {
            low: header.low,
            high: header.high,
            links,
        }))
    }

    /// Cursor on the first element
    pub fn head(&self, key: &str) -> Result<Option<Cursor<'_, B>>> {
        validate_key(key)?;
        match self.read_header(key)?.and_then(|h| h.head) {
            Some(slot) => self.cursor_at(key, slot),
            None => Ok(None),
        }
    }

    /// Cursor on the last element
    pub fn tail(&self, key: &str) -> Result<Option<Cursor<'_, B>>> {
        validate_key(key)?;
        match self.read_header(key)?.and_then(|h| h.tail) {
            Some(slot) => self.cursor_at(key, slot),
            None => Ok(None),
        }
    }

    /// Cursor on an arbitrary slot (`None` when the slot is not live)
    pub fn cursor_at(&self, key: &str, slot: i64) -> Result<Option<Cursor<'_, B>>> {
        validate_key(key)?;
        if self.read_header(key)?.is_none() {
            return Ok(None);
        }
        Ok(self
            .read_link(key, slot)?
            .map(|link| Cursor::new(self, key.to_string(), slot, link)))
    }

    // =========================================================================
    // Slot Operations (used by Cursor)
    // =========================================================================

    /// Splice `slot` out of the chain and return its value
    pub(crate) fn remove_slot(&self, key: &str, slot: i64) -> Result<Value> {
        let mut header = self.require_header(key, slot)?;
        let link = self.require_link(key, slot)?;

        match link.prev {
            Some(prev) => self.update_link(key, prev, |l| l.next = link.next)?,
            None => header.head = link.next,
        }
        match link.next {
            Some(next) => self.update_link(key, next, |l| l.prev = link.prev)?,
            None => header.tail = link.prev,
        }

        let value_key = slot_key(key, slot);
        let value = self.read_nested_value(&value_key)?.unwrap_or_else(|| {
            tracing::warn!(key, slot, "removed slot had no readable value");
            Value::Null
        });
        self.drop_slot_value(&value_key)?;
        self.backend.delete(&self.physical(key, SubKey::Link(slot)))?;

        if header.head.is_none() {
            // Restart past every slot ever allocated so old cursors stay stale
            header = ArrayHeader::empty_at(header.high + 1);
        }
        self.write_meta(key, &Meta::Array(header))?;

        tracing::debug!(key, slot, "removed slot");
        Ok(value)
    }

    /// Insert `value` right after `slot`
    pub(crate) fn insert_after_slot(&self, key: &str, slot: i64, value: &Value) -> Result<i64> {
        let header = self.require_header(key, slot)?;
        self.splice(key, header, slot, Side::After, value)
    }

    /// Insert `value` right before `slot`
    pub(crate) fn insert_before_slot(&self, key: &str, slot: i64, value: &Value) -> Result<i64> {
        let header = self.require_header(key, slot)?;
        self.splice(key, header, slot, Side::Before, value)
    }

    /// Overwrite the value stored at a live slot
    pub(crate) fn set_slot_value(&self, key: &str, slot: i64, value: &Value) -> Result<()> {
        self.require_header(key, slot)?;
        self.require_link(key, slot)?;
        self.write_nested_value(&slot_key(key, slot), value)
    }

    /// Read the value at `slot` (`None` once the slot is gone)
    pub(crate) fn slot_value(&self, key: &str, slot: i64) -> Result<Option<Value>> {
        self.read_nested_value(&slot_key(key, slot))
    }

    /// Current link record of `slot`, failing when it was removed
    pub(crate) fn require_link(&self, key: &str, slot: i64) -> Result<Link> {
        self.read_link(key, slot)?.ok_or_else(|| PropError::StaleCursor {
            key: key.to_string(),
            slot,
        })
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// First element of an empty array goes to slot `low`
    fn push_first(&self, key: &str, mut header: ArrayHeader, value: &Value) -> Result<i64> {
        let slot = header.low;

        self.write_nested_value(&slot_key(key, slot), value)?;
        self.write_link(key, slot, &Link::new(None, None))?;

        header.high = header.low;
        header.head = Some(slot);
        header.tail = Some(slot);
        self.write_meta(key, &Meta::Array(header))?;

        tracing::debug!(key, slot, "pushed first element");
        Ok(slot)
    }

    /// Allocate a slot outside the bounds and link it next to `anchor`
    ///
    /// Writes: new value, new link, anchor link, far neighbor link, header.
    fn splice(
        &self,
        key: &str,
        mut header: ArrayHeader,
        anchor: i64,
        side: Side,
        value: &Value,
    ) -> Result<i64> {
        let anchor_link = self.require_link(key, anchor)?;

        let (slot, link) = match side {
            Side::After => (header.high + 1, Link::new(Some(anchor), anchor_link.next)),
            Side::Before => (header.low - 1, Link::new(anchor_link.prev, Some(anchor))),
        };

        self.write_nested_value(&slot_key(key, slot), value)?;
        self.write_link(key, slot, &link)?;

        match side {
            Side::After => {
                self.update_link(key, anchor, |l| l.next = Some(slot))?;
                match link.next {
                    Some(next) => self.update_link(key, next, |l| l.prev = Some(slot))?,
                    None => header.tail = Some(slot),
                }
                header.high = slot;
            }
            Side::Before => {
                self.update_link(key, anchor, |l| l.prev = Some(slot))?;
                match link.prev {
                    Some(prev) => self.update_link(key, prev, |l| l.next = Some(slot))?,
                    None => header.head = Some(slot),
                }
                header.low = slot;
            }
        }

        self.write_meta(key, &Meta::Array(header))?;

        tracing::debug!(key, slot, anchor, ?side, "spliced slot");
        Ok(slot)
    }

    /// Slots reachable from `start` following `next`
    fn walk_slots(&self, key: &str, start: Option<i64>) -> Result<Vec<i64>> {
        let mut slots = Vec::new();
        let mut current = start;

        while let Some(slot) = current {
            match self.read_link(key, slot)? {
                Some(link) => {
                    slots.push(slot);
                    current = link.next;
                }
                None => {
                    tracing::warn!(key, slot, "dangling link, chain truncated");
                    break;
                }
            }
        }

        Ok(slots)
    }

    /// Header of `key`; absent is `None`, a value is a shape mismatch
    pub(crate) fn read_header(&self, key: &str) -> Result<Option<ArrayHeader>> {
        match self.read_meta(key)? {
            Some(Meta::Array(header)) => Ok(Some(header)),
            Some(Meta::Value { .. }) => Err(mismatch(key, Kind::Array, Kind::Value)),
            None => Ok(None),
        }
    }

    fn header_or_empty(&self, key: &str) -> Result<ArrayHeader> {
        Ok(self.read_header(key)?.unwrap_or_default())
    }

    /// Header for an operation on `slot`; a missing array makes the slot stale
    fn require_header(&self, key: &str, slot: i64) -> Result<ArrayHeader> {
        self.read_header(key)?.ok_or_else(|| PropError::StaleCursor {
            key: key.to_string(),
            slot,
        })
    }

    pub(crate) fn read_link(&self, key: &str, slot: i64) -> Result<Option<Link>> {
        let link_key = self.physical(key, SubKey::Link(slot));
        match self.backend.get(&link_key)? {
            Some(scalar) => Ok(Some(Link::decode(&link_key, &scalar)?)),
            None => Ok(None),
        }
    }

    fn write_link(&self, key: &str, slot: i64, link: &Link) -> Result<()> {
        self.backend
            .set(&self.physical(key, SubKey::Link(slot)), link.encode()?)
    }

    fn update_link(&self, key: &str, slot: i64, update: impl FnOnce(&mut Link)) -> Result<()> {
        let link_key = self.physical(key, SubKey::Link(slot));
        let mut link = self.read_link(key, slot)?.ok_or_else(|| PropError::CorruptRecord {
            key: link_key,
            reason: "neighbor link missing".to_string(),
        })?;
        update(&mut link);
        self.write_link(key, slot, &link)
    }

    /// Slot number of a physical `K#link[s]` key
    fn parse_link_slot(&self, key: &str, physical: &str) -> Option<i64> {
        physical
            .strip_prefix(self.namespace.owned_prefix(key).as_str())?
            .strip_prefix("link[")?
            .strip_suffix(']')?
            .parse()
            .ok()
    }

    /// Delete every link and slot key of `key`, leaving its meta
    pub(crate) fn purge_array_data(&self, key: &str) -> Result<()> {
        let meta_key = self.physical(key, SubKey::Meta);
        for physical in self.physical_keys(key)? {
            if physical != meta_key {
                self.backend.delete(&physical)?;
            }
        }
        Ok(())
    }

    /// Delete the chunks and meta of a slot value
    fn drop_slot_value(&self, value_key: &str) -> Result<()> {
        match self.read_meta(value_key)? {
            Some(Meta::Value { chunks }) => self.drop_chunked(value_key, chunks),
            _ => self.delete_meta(value_key),
        }
    }
}
