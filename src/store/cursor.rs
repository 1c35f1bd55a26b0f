//! Array cursor
//!
//! A cursor is bound to one slot of one array. It owns no persisted state:
//! every read goes back to the backend, and neighbors are resolved from the
//! slot's current link record rather than the copy taken when the cursor
//! was created. Once its slot is removed the cursor is stale; reads report
//! the element as gone and writes fail with `StaleCursor`.

use serde_json::Value;

use crate::backend::PropertyBackend;
use crate::error::Result;
use crate::index::Link;

use super::Store;

/// Traversal handle on one array slot
pub struct Cursor<'s, B> {
    store: &'s Store<B>,
    key: String,
    slot: i64,
    /// Link record as of cursor creation; informational only
    link: Link,
}

impl<'s, B: PropertyBackend> Cursor<'s, B> {
    pub(crate) fn new(store: &'s Store<B>, key: String, slot: i64, link: Link) -> Self {
        Self {
            store,
            key,
            slot,
            link,
        }
    }

    /// Logical key of the array
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Slot this cursor is bound to
    pub fn slot(&self) -> i64 {
        self.slot
    }

    /// Link record captured when the cursor was created
    pub fn cached_link(&self) -> Link {
        self.link
    }

    /// The element at this slot, or `None` if it has been removed
    pub fn value(&self) -> Result<Option<Value>> {
        self.store.slot_value(&self.key, self.slot)
    }

    /// Overwrite the element at this slot
    pub fn set_value(&self, value: &Value) -> Result<()> {
        self.store.set_slot_value(&self.key, self.slot, value)
    }

    /// Cursor on the following element (`None` at the tail)
    pub fn next(&self) -> Result<Option<Cursor<'s, B>>> {
        let link = self.store.require_link(&self.key, self.slot)?;
        self.neighbor(link.next)
    }

    /// Cursor on the preceding element (`None` at the head)
    pub fn previous(&self) -> Result<Option<Cursor<'s, B>>> {
        let link = self.store.require_link(&self.key, self.slot)?;
        self.neighbor(link.prev)
    }

    /// Remove this element from the array and return it
    ///
    /// The cursor is stale afterwards.
    pub fn remove(&self) -> Result<Value> {
        self.store.remove_slot(&self.key, self.slot)
    }

    /// Insert `value` after this element; returns a cursor on the new element
    pub fn insert_after(&self, value: &Value) -> Result<Cursor<'s, B>> {
        let slot = self.store.insert_after_slot(&self.key, self.slot, value)?;
        self.bind(slot)
    }

    /// Insert `value` before this element; returns a cursor on the new element
    pub fn insert_before(&self, value: &Value) -> Result<Cursor<'s, B>> {
        let slot = self.store.insert_before_slot(&self.key, self.slot, value)?;
        self.bind(slot)
    }

    fn neighbor(&self, slot: Option<i64>) -> Result<Option<Cursor<'s, B>>> {
        match slot {
            Some(slot) => self.store.cursor_at(&self.key, slot),
            None => Ok(None),
        }
    }

    fn bind(&self, slot: i64) -> Result<Cursor<'s, B>> {
        let link = self.store.require_link(&self.key, slot)?;
        Ok(Cursor::new(self.store, self.key.clone(), slot, link))
    }
}

impl<B> std::fmt::Debug for Cursor<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("key", &self.key)
            .field("slot", &self.slot)
            .field("link", &self.link)
            .finish()
    }
}
