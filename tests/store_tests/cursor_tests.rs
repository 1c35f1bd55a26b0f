//! Tests for array cursors
//!
//! These tests verify:
//! - Forward and backward traversal
//! - Splicing new elements in before/after a cursor
//! - Stale cursors after removal
//! - Neighbors are resolved from current state, not the cached link

use propkv::backend::MemoryBackend;
use propkv::{Link, PropError, Store, Value};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_array(values: &[i64]) -> Store<MemoryBackend> {
    let store = Store::new(MemoryBackend::new());
    for v in values {
        store.push_right("k", &json!(v)).unwrap();
    }
    store
}

fn backward(store: &Store<MemoryBackend>, key: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut cursor = store.tail(key).unwrap();
    while let Some(c) = cursor {
        values.push(c.value().unwrap().unwrap());
        cursor = c.previous().unwrap();
    }
    values
}

// =============================================================================
// Traversal Tests
// =============================================================================

#[test]
fn test_traverse_both_directions() {
    let store = setup_array(&[10, 20, 30]);

    let head = store.head("k").unwrap().unwrap();
    assert_eq!(head.value().unwrap(), Some(json!(10)));
    assert!(head.previous().unwrap().is_none());

    let middle = head.next().unwrap().unwrap();
    assert_eq!(middle.value().unwrap(), Some(json!(20)));

    let tail = middle.next().unwrap().unwrap();
    assert_eq!(tail.value().unwrap(), Some(json!(30)));
    assert!(tail.next().unwrap().is_none());

    assert_eq!(backward(&store, "k"), vec![json!(30), json!(20), json!(10)]);
}

#[test]
fn test_cursor_at_slot() {
    let store = setup_array(&[1, 2, 3]);

    let cursor = store.cursor_at("k", 1).unwrap().unwrap();
    assert_eq!(cursor.key(), "k");
    assert_eq!(cursor.slot(), 1);
    assert_eq!(cursor.cached_link(), Link::new(Some(0), Some(2)));
    assert_eq!(cursor.value().unwrap(), Some(json!(2)));

    assert!(store.cursor_at("k", 99).unwrap().is_none());
    assert!(store.cursor_at("missing", 0).unwrap().is_none());
}

// =============================================================================
// Mutation Tests
// =============================================================================

#[test]
fn test_set_value_through_cursor() {
    let store = setup_array(&[1, 2, 3]);

    let cursor = store.cursor_at("k", 1).unwrap().unwrap();
    cursor.set_value(&json!({"replaced": true})).unwrap();

    assert_eq!(
        store.to_vec("k").unwrap(),
        vec![json!(1), json!({"replaced": true}), json!(3)]
    );
}

#[test]
fn test_insert_after_and_before_allocate_outside_bounds() {
    let store = setup_array(&[1, 2, 3]);

    let middle = store.cursor_at("k", 1).unwrap().unwrap();

    let after = middle.insert_after(&json!("after")).unwrap();
    assert_eq!(after.slot(), 3);

    let before = middle.insert_before(&json!("before")).unwrap();
    assert_eq!(before.slot(), -1);

    assert_eq!(
        store.to_vec("k").unwrap(),
        vec![json!(1), json!("before"), json!(2), json!("after"), json!(3)]
    );

    let index = store.array_index("k").unwrap().unwrap();
    assert_eq!((index.low, index.high), (-1, 3));
    assert!(index.is_consistent());
    assert_eq!(index.head(), Some(0));
    assert_eq!(index.tail(), Some(2));
}

#[test]
fn test_insert_at_ends_moves_head_and_tail() {
    let store = setup_array(&[5]);

    let only = store.head("k").unwrap().unwrap();
    only.insert_before(&json!(4)).unwrap();
    only.insert_after(&json!(6)).unwrap();

    assert_eq!(store.to_vec("k").unwrap(), vec![json!(4), json!(5), json!(6)]);
    assert_eq!(store.head("k").unwrap().unwrap().value().unwrap(), Some(json!(4)));
    assert_eq!(store.tail("k").unwrap().unwrap().value().unwrap(), Some(json!(6)));
    assert_eq!(store.pop_left("k").unwrap(), Some(json!(4)));
    assert_eq!(store.pop_right("k").unwrap(), Some(json!(6)));
}

#[test]
fn test_remove_middle_relinks_neighbors() {
    let store = setup_array(&[1, 2, 3]);

    let middle = store.cursor_at("k", 1).unwrap().unwrap();
    assert_eq!(middle.remove().unwrap(), json!(2));

    assert_eq!(store.to_vec("k").unwrap(), vec![json!(1), json!(3)]);
    assert_eq!(backward(&store, "k"), vec![json!(3), json!(1)]);

    let head = store.head("k").unwrap().unwrap();
    assert_eq!(head.next().unwrap().unwrap().slot(), 2);
}

#[test]
fn test_remove_only_element_empties_array() {
    let store = setup_array(&[1]);

    let only = store.head("k").unwrap().unwrap();
    only.remove().unwrap();

    assert_eq!(store.length("k").unwrap(), 0);
    assert!(store.head("k").unwrap().is_none());
    assert!(store.array_index("k").unwrap().unwrap().is_empty());
}

// =============================================================================
// Stale Cursor Tests
// =============================================================================

#[test]
fn test_removed_cursor_is_stale() {
    let store = setup_array(&[1, 2, 3]);

    let cursor = store.cursor_at("k", 1).unwrap().unwrap();
    cursor.remove().unwrap();

    assert_eq!(cursor.value().unwrap(), None);

    let is_stale = |r: propkv::Result<()>| matches!(r, Err(PropError::StaleCursor { slot: 1, .. }));
    assert!(is_stale(cursor.set_value(&json!(9))));
    assert!(is_stale(cursor.remove().map(|_| ())));
    assert!(is_stale(cursor.next().map(|_| ())));
    assert!(is_stale(cursor.previous().map(|_| ())));
    assert!(is_stale(cursor.insert_after(&json!(9)).map(|_| ())));
    assert!(is_stale(cursor.insert_before(&json!(9)).map(|_| ())));

    // Nothing leaked into the array
    assert_eq!(store.to_vec("k").unwrap(), vec![json!(1), json!(3)]);
}

#[test]
fn test_cursor_stale_after_pop() {
    let store = setup_array(&[1, 2]);

    let tail = store.tail("k").unwrap().unwrap();
    store.pop_right("k").unwrap();

    assert_eq!(tail.value().unwrap(), None);
    assert!(matches!(
        tail.set_value(&json!(0)),
        Err(PropError::StaleCursor { .. })
    ));
}

#[test]
fn test_cursor_stale_after_drop() {
    let store = setup_array(&[1, 2]);

    let head = store.head("k").unwrap().unwrap();
    store.drop_array("k").unwrap();

    assert_eq!(head.value().unwrap(), None);
    assert!(matches!(
        head.insert_after(&json!(0)),
        Err(PropError::StaleCursor { .. })
    ));
}

#[test]
fn test_cursor_stays_stale_after_array_refills() {
    let store = Store::new(MemoryBackend::new());
    store.push_right("k", &json!("a")).unwrap();
    store.push_right("k", &json!("b")).unwrap();

    let stale = store.tail("k").unwrap().unwrap();
    stale.remove().unwrap();
    store.pop_right("k").unwrap();
    assert_eq!(store.length("k").unwrap(), 0);

    let x = store.push_right("k", &json!("x")).unwrap();
    let y = store.push_right("k", &json!("y")).unwrap();
    assert!(x > stale.slot() && y > stale.slot());

    assert_eq!(stale.value().unwrap(), None);
    assert!(matches!(
        stale.set_value(&json!("clobbered")),
        Err(PropError::StaleCursor { .. })
    ));
    assert_eq!(store.to_vec("k").unwrap(), vec![json!("x"), json!("y")]);
}

#[test]
fn test_next_uses_current_links() {
    let store = setup_array(&[1, 2]);

    let head = store.head("k").unwrap().unwrap();
    let cached = head.cached_link();

    // Splice through a second cursor on the same slot
    let other = store.head("k").unwrap().unwrap();
    let inserted = other.insert_after(&json!("new")).unwrap();

    // The first cursor's cached link still points at the old neighbor
    assert_eq!(head.cached_link(), cached);
    assert_eq!(cached.next, Some(1));

    let next = head.next().unwrap().unwrap();
    assert_eq!(next.slot(), inserted.slot());
    assert_eq!(next.value().unwrap(), Some(json!("new")));
}
