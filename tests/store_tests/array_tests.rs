//! Tests for sparse linked arrays
//!
//! These tests verify:
//! - FIFO and LIFO behavior of push/pop at both ends
//! - Slot allocation and bounds
//! - Empty/absent boundaries and shape checks
//! - Chain integrity under randomized operation sequences

use std::collections::VecDeque;

use propkv::backend::{MemoryBackend, PropertyBackend};
use propkv::{Config, Kind, PropError, Store, Value};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store() -> Store<MemoryBackend> {
    Store::new(MemoryBackend::new())
}

fn setup_store_with_chunk(chunk: usize) -> Store<MemoryBackend> {
    let config = Config::builder().value_size_limit(chunk).build();
    Store::with_config(MemoryBackend::new(), &config).unwrap()
}

fn traverse(store: &Store<MemoryBackend>, key: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut cursor = store.head(key).unwrap();
    while let Some(c) = cursor {
        values.push(c.value().unwrap().unwrap());
        cursor = c.next().unwrap();
    }
    values
}

/// Walk both directions and check every live slot still has its value
fn assert_chain_integrity(store: &Store<MemoryBackend>, key: &str) {
    let index = store.array_index(key).unwrap().unwrap();
    assert!(index.is_consistent(), "inconsistent index: {:?}", index);

    let forward = index.forward();
    let mut backward = index.backward();
    backward.reverse();
    assert_eq!(forward, backward);
    assert_eq!(forward.len(), index.links.len());

    for slot in forward {
        let value_meta = format!("{}#slot[{}]#meta", key, slot);
        assert!(
            store.backend().get(&value_meta).unwrap().is_some(),
            "slot {} has no value",
            slot
        );
    }
}

// =============================================================================
// Push / Pop Tests
// =============================================================================

#[test]
fn test_push_both_ends_then_pop() {
    let store = setup_store();

    store.push_right("k", &json!(1)).unwrap();
    store.push_right("k", &json!(2)).unwrap();
    store.push_right("k", &json!(3)).unwrap();
    store.push_left("k", &json!(0)).unwrap();

    assert_eq!(traverse(&store, "k"), vec![json!(0), json!(1), json!(2), json!(3)]);

    assert_eq!(store.pop_right("k").unwrap(), Some(json!(3)));
    assert_eq!(traverse(&store, "k"), vec![json!(0), json!(1), json!(2)]);
    assert_chain_integrity(&store, "k");
}

#[test]
fn test_fifo_order() {
    let store = setup_store();

    for i in 0..25 {
        store.push_right("queue", &json!(i)).unwrap();
    }
    for i in 0..25 {
        assert_eq!(store.pop_left("queue").unwrap(), Some(json!(i)));
    }
    assert_eq!(store.pop_left("queue").unwrap(), None);
}

#[test]
fn test_lifo_order() {
    let store = setup_store();

    for i in 0..25 {
        store.push_right("stack", &json!(i)).unwrap();
    }
    for i in (0..25).rev() {
        assert_eq!(store.pop_right("stack").unwrap(), Some(json!(i)));
    }
    assert_eq!(store.pop_right("stack").unwrap(), None);
}

#[test]
fn test_left_side_fifo_and_lifo() {
    let store = setup_store();

    for i in 0..10 {
        store.push_left("k", &json!(i)).unwrap();
    }
    for i in 0..5 {
        assert_eq!(store.pop_right("k").unwrap(), Some(json!(i)));
    }
    for i in (5..10).rev() {
        assert_eq!(store.pop_left("k").unwrap(), Some(json!(i)));
    }
    assert_eq!(store.length("k").unwrap(), 0);
}

#[test]
fn test_slot_allocation_and_bounds() {
    let store = setup_store();

    assert_eq!(store.push_right("k", &json!("a")).unwrap(), 0);
    assert_eq!(store.push_right("k", &json!("b")).unwrap(), 1);
    assert_eq!(store.push_left("k", &json!("z")).unwrap(), -1);
    assert_eq!(store.push_left("k", &json!("y")).unwrap(), -2);

    let index = store.array_index("k").unwrap().unwrap();
    assert_eq!(index.low, -2);
    assert_eq!(index.high, 1);
    assert_eq!(index.forward(), vec![-2, -1, 0, 1]);
    assert_eq!(index.head(), Some(-2));
    assert_eq!(index.tail(), Some(1));
}

#[test]
fn test_bounds_never_retract_while_populated() {
    let store = setup_store();

    for i in 0..4 {
        store.push_right("k", &json!(i)).unwrap();
    }
    store.pop_right("k").unwrap();
    store.pop_right("k").unwrap();

    let index = store.array_index("k").unwrap().unwrap();
    assert_eq!(index.high, 3);
    assert_eq!(index.forward(), vec![0, 1]);

    // Next append goes beyond the old high mark
    assert_eq!(store.push_right("k", &json!("next")).unwrap(), 4);
}

#[test]
fn test_emptied_array_keeps_bounds_moving_outward() {
    let store = setup_store();

    store.push_left("k", &json!(1)).unwrap();
    store.push_left("k", &json!(2)).unwrap();
    store.pop_left("k").unwrap();
    store.pop_left("k").unwrap();

    // Slots -1 and 0 were used; the sentinel sits past both
    let index = store.array_index("k").unwrap().unwrap();
    assert!(index.is_empty());
    assert_eq!((index.low, index.high), (1, 1));
    assert_eq!(store.kind("k").unwrap(), Some(Kind::Array));
    assert_eq!(store.physical_keys("k").unwrap(), vec!["k#meta".to_string()]);

    assert_eq!(store.push_right("k", &json!("again")).unwrap(), index.low);
    assert_eq!(store.to_vec("k").unwrap(), vec![json!("again")]);
}

// =============================================================================
// Boundary Tests
// =============================================================================

#[test]
fn test_pop_absent_and_empty() {
    let store = setup_store();

    assert_eq!(store.pop_right("none").unwrap(), None);
    assert_eq!(store.pop_left("none").unwrap(), None);
    assert_eq!(store.length("none").unwrap(), 0);
    assert!(store.head("none").unwrap().is_none());
    assert!(store.array_index("none").unwrap().is_none());

    store.create_array("empty").unwrap();
    assert_eq!(store.kind("empty").unwrap(), Some(Kind::Array));
    assert_eq!(store.pop_right("empty").unwrap(), None);
    assert_eq!(store.length("empty").unwrap(), 0);
    assert!(store.tail("empty").unwrap().is_none());
}

#[test]
fn test_array_ops_on_value_are_shape_mismatch() {
    let store = setup_store();
    store.set_value("scalar", &json!("text")).unwrap();

    for result in [
        store.push_right("scalar", &json!(1)).map(|_| ()),
        store.push_left("scalar", &json!(1)).map(|_| ()),
        store.pop_right("scalar").map(|_| ()),
        store.pop_left("scalar").map(|_| ()),
        store.length("scalar").map(|_| ()),
        store.drop_array("scalar"),
    ] {
        match result {
            Err(PropError::ShapeMismatch { expected, found, .. }) => {
                assert_eq!(expected, Kind::Array);
                assert_eq!(found, Kind::Value);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    // The value is untouched
    assert_eq!(store.get("scalar").unwrap(), Some(json!("text")));
}

#[test]
fn test_create_array_replaces_value() {
    let store = setup_store_with_chunk(4);
    store.set_value("k", &json!("a long value")).unwrap();

    store.create_array("k").unwrap();

    assert_eq!(store.kind("k").unwrap(), Some(Kind::Array));
    assert_eq!(store.physical_keys("k").unwrap(), vec!["k#meta".to_string()]);
}

#[test]
fn test_create_array_keeps_existing_elements() {
    let store = setup_store();
    store.push_right("k", &json!(1)).unwrap();

    store.create_array("k").unwrap();

    assert_eq!(store.to_vec("k").unwrap(), vec![json!(1)]);
}

#[test]
fn test_drop_array_leaves_nothing() {
    let store = setup_store_with_chunk(5);

    for i in 0..6 {
        store.push_right("k", &json!({"i": i, "pad": "-----"})).unwrap();
    }
    store.set_value("other", &json!("keep me")).unwrap();

    store.drop_array("k").unwrap();

    assert!(store.physical_keys("k").unwrap().is_empty());
    assert_eq!(store.kind("k").unwrap(), None);
    assert_eq!(store.get("other").unwrap(), Some(json!("keep me")));

    // Dropping again is a no-op
    store.drop_array("k").unwrap();
}

#[test]
fn test_elements_larger_than_chunk_size() {
    let store = setup_store_with_chunk(8);
    let big = json!("ünïcödé ".repeat(10));

    store.push_right("k", &json!("small")).unwrap();
    store.push_right("k", &big).unwrap();

    assert_eq!(store.length("k").unwrap(), 2);
    assert_eq!(store.pop_right("k").unwrap(), Some(big));
    assert_eq!(store.pop_right("k").unwrap(), Some(json!("small")));
    assert_eq!(store.physical_keys("k").unwrap(), vec!["k#meta".to_string()]);
}

#[test]
fn test_length_and_to_vec() {
    let store = setup_store();

    for word in ["b", "c", "d"] {
        store.push_right("k", &json!(word)).unwrap();
    }
    store.push_left("k", &json!("a")).unwrap();

    assert_eq!(store.length("k").unwrap(), 4);
    assert_eq!(
        store.to_vec("k").unwrap(),
        vec![json!("a"), json!("b"), json!("c"), json!("d")]
    );
}

#[test]
fn test_keys_lists_arrays_and_values_once() {
    let store = setup_store();

    store.push_right("list", &json!(1)).unwrap();
    store.push_right("list", &json!(2)).unwrap();
    store.set_value("value", &json!(3)).unwrap();

    let mut keys = store.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["list".to_string(), "value".to_string()]);
}

// =============================================================================
// Randomized Integrity Tests
// =============================================================================

#[test]
fn test_random_operations_keep_chain_intact() {
    for seed in [1u64, 7, 42, 1234] {
        let store = setup_store_with_chunk(6);
        let mut rng = oorandom::Rand32::new(seed);
        let mut model: VecDeque<i64> = VecDeque::new();
        let mut next_value = 0i64;

        for _ in 0..300 {
            let op = rng.rand_range(0..6);
            match op {
                0 => {
                    store.push_right("k", &json!(next_value)).unwrap();
                    model.push_back(next_value);
                    next_value += 1;
                }
                1 => {
                    store.push_left("k", &json!(next_value)).unwrap();
                    model.push_front(next_value);
                    next_value += 1;
                }
                2 => {
                    let expected = model.pop_back().map(|v| json!(v));
                    assert_eq!(store.pop_right("k").unwrap(), expected);
                }
                3 => {
                    let expected = model.pop_front().map(|v| json!(v));
                    assert_eq!(store.pop_left("k").unwrap(), expected);
                }
                4 if !model.is_empty() => {
                    let pos = rng.rand_range(0..model.len() as u32) as usize;
                    let slot = store.array_index("k").unwrap().unwrap().forward()[pos];
                    let cursor = store.cursor_at("k", slot).unwrap().unwrap();
                    if rng.rand_range(0..2) == 0 {
                        cursor.insert_after(&json!(next_value)).unwrap();
                        model.insert(pos + 1, next_value);
                    } else {
                        cursor.insert_before(&json!(next_value)).unwrap();
                        model.insert(pos, next_value);
                    }
                    next_value += 1;
                }
                5 if !model.is_empty() => {
                    let pos = rng.rand_range(0..model.len() as u32) as usize;
                    let slot = store.array_index("k").unwrap().unwrap().forward()[pos];
                    let cursor = store.cursor_at("k", slot).unwrap().unwrap();
                    let removed = cursor.remove().unwrap();
                    assert_eq!(removed, json!(model.remove(pos).unwrap()));
                }
                _ => {}
            }

            let expected: Vec<Value> = model.iter().map(|v| json!(v)).collect();
            assert_eq!(store.to_vec("k").unwrap(), expected, "seed {}", seed);
            assert_eq!(store.length("k").unwrap(), model.len());
            if store.kind("k").unwrap().is_some() {
                assert_chain_integrity(&store, "k");
            }
        }
    }
}
