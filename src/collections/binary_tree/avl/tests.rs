#![cfg(test)]

use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash};
use std::ops::ControlFlow;

use pretty_assertions::assert_eq;
use proptest::collection::vec;
use proptest::prelude::*;

use super::*;
use crate::collections::binary_tree::{DuplicateKey, EmptyTree, KeyNotFound};
use crate::util::alloc::CountedDrop;
use crate::util::panic::assert_panics;

/// Walks the whole tree checking ordering, cached heights, balance and agreement with the index
/// cache. Returns the height of the subtree at `id`.
fn check_subtree<K: Ord + Hash + Clone, V, B: BuildHasher>(
    tree: &AvlTree<K, V, B>,
    id: Option<NodeId>,
    lower: Option<&K>,
    upper: Option<&K>,
    seen: &mut usize,
) -> i32 {
    let Some(id) = id else {
        return -1;
    };
    let node = &tree.nodes[id];
    *seen += 1;

    if let Some(lower) = lower {
        assert!(&node.key > lower, "Keys in a right subtree should be greater than the parent.");
    }
    if let Some(upper) = upper {
        assert!(&node.key < upper, "Keys in a left subtree should be less than the parent.");
    }
    assert_eq!(
        tree.index.get(&node.key),
        Ok(&id),
        "Every node should be reachable through the index cache."
    );

    let left = check_subtree(tree, node.left, lower, Some(&node.key), seen);
    let right = check_subtree(tree, node.right, Some(&node.key), upper, seen);

    assert_eq!(node.height, left.max(right) + 1, "Cached heights should be accurate.");
    assert!((left - right).abs() <= 1, "Every node should be balanced.");
    node.height
}

fn assert_valid<K: Ord + Hash + Clone, V, B: BuildHasher>(tree: &AvlTree<K, V, B>) {
    let mut seen = 0;
    check_subtree(tree, tree.root, None, None, &mut seen);

    assert_eq!(seen, tree.len(), "The tree and the index cache should hold the same keys.");
    assert_eq!(tree.nodes.len(), tree.len(), "No node should be left allocated after removal.");
}

fn sample_tree() -> AvlTree<i32, i32> {
    let mut tree = AvlTree::new();
    for (key, value) in [(0, 1), (1, 1), (8, 2), (-2, 9), (-3, 9), (33, 2), (35, 2), (36, 2)] {
        tree.insert(key, value).unwrap();
        assert_valid(&tree);
    }
    tree
}

#[test]
fn test_insert_and_order() {
    let tree = sample_tree();

    assert_eq!(tree.len(), 8);
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [-3, -2, 0, 1, 8, 33, 35, 36]);
    assert_eq!(tree.values().copied().collect::<Vec<_>>(), [9, 9, 1, 1, 2, 2, 2, 2]);
    assert_eq!(tree.height(), 4);
}

#[test]
fn test_ascending_inserts_stay_balanced() {
    let mut tree = AvlTree::<u32, ()>::new();
    for i in 0..1023 {
        tree.insert(i, ()).unwrap();
    }

    assert_valid(&tree);
    assert_eq!(tree.height(), 10, "A full tree of 1023 nodes has exactly 10 levels.");
}

#[test]
fn test_duplicate_insert_leaves_tree_unchanged() {
    let mut tree = sample_tree();
    let before = tree.create_output();

    assert_eq!(tree.insert(8, 100), Err(DuplicateKey));
    assert_eq!(tree.len(), 8);
    assert_eq!(tree.get(&8), Ok(&2), "A failed insert shouldn't overwrite the value.");
    assert_eq!(tree.create_output(), before);
    assert_valid(&tree);
}

#[test]
fn test_remove() {
    let mut tree = sample_tree();

    // Node with one child, node with two children, the root, then a leaf.
    for (key, value) in [(35, 2), (-2, 9), (1, 1), (36, 2)] {
        assert_eq!(tree.remove(&key), Ok(value));
        assert!(!tree.contains_key(&key));
        assert_eq!(tree.search(&key), None);
        assert_valid(&tree);
    }

    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [-3, 0, 8, 33]);
    assert_eq!(tree.root.map(|id| tree.nodes[id].key), Some(8), "The successor replaces the root.");
    assert_eq!(tree.remove(&1), Err(KeyNotFound), "Removing twice should fail.");
    assert_eq!(tree.remove(&1000), Err(KeyNotFound));
    assert_eq!(tree.len(), 4);
}

#[test]
fn test_remove_everything() {
    let mut tree = sample_tree();
    for key in [0, 1, 8, -2, -3, 33, 35, 36] {
        tree.remove(&key).unwrap();
        assert_valid(&tree);
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.root, None);
}

#[test]
fn test_removed_slots_are_reused() {
    let mut tree = sample_tree();
    tree.remove(&8).unwrap();
    tree.insert(9, 3).unwrap();

    assert_valid(&tree);
    assert_eq!(tree.get(&9), Ok(&3));
    assert_eq!(tree.get(&8), Err(KeyNotFound));
}

#[test]
fn test_min_max() {
    let tree = sample_tree();
    assert_eq!(tree.min_key(), Ok(&-3));
    assert_eq!(tree.max_key(), Ok(&36));
    assert_eq!(tree.min_value(), Some(&9));
    assert_eq!(tree.max_value(), Some(&2));

    let empty = AvlTree::<i32, i32>::new();
    assert_eq!(empty.min_key(), Err(EmptyTree));
    assert_eq!(empty.max_key(), Err(EmptyTree));
    assert_eq!(empty.min_value(), None);
    assert_eq!(empty.max_value(), None);
}

#[test]
fn test_get_and_search() {
    let mut tree = sample_tree();
    assert_eq!(tree.get(&-2), Ok(&9));
    assert_eq!(tree.get(&2), Err(KeyNotFound));
    assert_eq!(tree.search(&35), Some(&2));
    assert_eq!(tree.search(&34), None);

    *tree.get_mut(&35).unwrap() = 20;
    assert_eq!(tree.search(&35), Some(&20));
    assert_eq!(tree.get_mut(&34), Err(KeyNotFound));
}

#[test]
fn test_string_keys() {
    let mut tree = AvlTree::<String, usize>::new();
    for word in ["pear", "apple", "fig", "quince"] {
        tree.insert(word.to_owned(), word.len()).unwrap();
    }

    assert_eq!(tree.get("fig"), Ok(&3));
    assert_eq!(tree.min_key().map(String::as_str), Ok("apple"));
    assert_eq!(tree.successor("fig").map(|(k, _)| k.as_str()), Some("pear"));
    assert_eq!(tree.remove("pear"), Ok(4));
    assert_valid(&tree);
}

#[test]
fn test_successor_predecessor() {
    let tree = sample_tree();
    let sorted = [-3, -2, 0, 1, 8, 33, 35, 36];

    for window in sorted.windows(2) {
        assert_eq!(tree.successor(&window[0]).map(|(k, _)| *k), Some(window[1]));
        assert_eq!(tree.predecessor(&window[1]).map(|(k, _)| *k), Some(window[0]));
    }

    assert_eq!(tree.successor(&36), None, "The largest key has no successor.");
    assert_eq!(tree.predecessor(&-3), None, "The smallest key has no predecessor.");
    assert_eq!(tree.successor(&2), None, "Absent keys have no successor.");
    assert_eq!(tree.predecessor(&2), None, "Absent keys have no predecessor.");
}

#[test]
fn test_clear() {
    let mut tree = sample_tree();
    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.min_key(), Err(EmptyTree));
    assert_eq!(tree.create_output(), "");
    assert_valid(&tree);

    tree.insert(1, 1).unwrap();
    assert_eq!(tree.len(), 1, "A cleared tree should be reusable.");
    assert_valid(&tree);
}

#[test]
fn test_iterate_orders() {
    let tree = sample_tree();

    let mut sorted = Vec::new();
    let _ = tree.iterate(|k, _| {
        sorted.push(*k);
        ControlFlow::<()>::Continue(())
    });
    assert_eq!(sorted, [-3, -2, 0, 1, 8, 33, 35, 36]);

    let mut inserted = Vec::new();
    let _ = tree.iterate_inserted(|k, _| {
        inserted.push(*k);
        ControlFlow::<()>::Continue(())
    });
    assert_eq!(inserted, [0, 1, 8, -2, -3, 33, 35, 36]);

    let found = tree.iterate(|k, v| if *v == 2 {
        ControlFlow::Break(*k)
    } else {
        ControlFlow::Continue(())
    });
    assert_eq!(found, ControlFlow::Break(8), "Iteration should stop at the first break.");
}

#[test]
fn test_create_output() {
    let tree = sample_tree();
    let output = tree.create_output();
    let lines = output.lines().collect::<Vec<_>>();

    assert_eq!(lines.len(), 8, "One line per node.");
    assert!(lines[0].starts_with("Node level 0: "), "The root comes first.");
    assert!(lines.iter().all(|l| l.ends_with("Mapped=true")));
    assert!(lines.iter().any(|l| l.contains("Key=-3 Value=9")));
}

#[test]
fn test_display_and_debug() {
    let mut tree = AvlTree::<i32, char>::new();
    for (k, v) in [(2, 'b'), (1, 'a'), (3, 'c')] {
        tree.insert(k, v).unwrap();
    }

    assert_eq!(tree.to_string(), "{1: 'a', 2: 'b', 3: 'c'}");
    assert!(format!("{tree:?}").contains("(2: 'b')"));
}

#[test]
fn test_into_iter_and_clone() {
    let tree = sample_tree();
    let copy = tree.clone();

    assert_eq!(
        tree.into_iter().collect::<Vec<_>>(),
        copy.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>()
    );
    assert_valid(&copy);
    assert_eq!((&copy).into_iter().len(), 8);
}

#[test]
fn test_drops() {
    let counter = CountedDrop::new(0);
    let mut tree = AvlTree::<u8, CountedDrop>::new();
    for i in 0..10 {
        tree.insert(i, counter.clone()).unwrap();
    }

    drop(tree.remove(&3).unwrap());
    assert_eq!(counter.count(), 1);

    tree.clear();
    assert_eq!(counter.count(), 10, "Clearing should drop every value once.");

    for i in 0..5 {
        tree.insert(i, counter.clone()).unwrap();
    }
    drop(tree);
    assert_eq!(counter.count(), 15, "Dropping the tree should drop every value once.");
}

#[test]
fn test_stale_index_entry_panics_on_remove() {
    assert_panics!({
        let mut tree = sample_tree();
        // Point the cache at a key the tree never received.
        tree.index.add(5, 0).unwrap();
        let _ = tree.remove(&5);
    }, "indexed key missing from the tree");
}

#[test]
fn test_missing_index_entry_panics_on_insert() {
    assert_panics!({
        let mut tree = sample_tree();
        tree.index.remove(&8).unwrap();
        let _ = tree.insert(8, 0);
    }, "duplicate key reached the tree past the index");
}

proptest! {
    #[test]
    fn prop_matches_sorted_model(ops in vec((any::<bool>(), 0_i16..200), 0..300)) {
        let mut tree = AvlTree::<i16, i16>::new();
        let mut model = BTreeMap::new();

        for (insert, key) in ops {
            if insert {
                let expected = if model.contains_key(&key) { Err(DuplicateKey) } else { Ok(()) };
                prop_assert_eq!(tree.insert(key, -key), expected);
                model.entry(key).or_insert(-key);
            } else {
                let expected = model.remove(&key).ok_or(KeyNotFound);
                prop_assert_eq!(tree.remove(&key), expected);
            }
        }

        assert_valid(&tree);
        prop_assert_eq!(
            tree.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            model.into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_height_is_logarithmic(keys in vec(any::<i32>(), 1..500)) {
        let mut tree = AvlTree::<i32, ()>::new();
        for key in keys {
            let _ = tree.insert(key, ());
        }

        // An AVL tree of n nodes is never taller than about 1.44 log2(n + 2).
        let bound = 1.45 * ((tree.len() + 2) as f64).log2();
        prop_assert!((tree.height() as f64) <= bound);
    }
}
