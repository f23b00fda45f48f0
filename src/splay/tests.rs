use super::SplayTree;
use crate::set::OrderedSet;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

fn tree_with(keys: &[i64]) -> SplayTree<i64> {
    let mut tree = SplayTree::new();
    for &key in keys {
        tree.insert(key);
        tree.assert_valid();
    }
    tree
}

#[test]
fn inserted_key_becomes_root() {
    let mut tree = SplayTree::new();
    for key in [5, 3, 8, 1] {
        tree.insert(key);
        assert_eq!(tree.root_key(), Some(&key));
    }
    assert_eq!(tree.values(), vec![1, 3, 5, 8]);
}

#[test]
fn has_does_not_restructure() {
    let tree = tree_with(&[5, 3, 8, 1]);
    assert!(tree.has(&5));
    assert!(!tree.has(&4));
    assert_eq!(tree.root_key(), Some(&1));
}

#[test]
fn access_splays_found_key() {
    let mut tree = tree_with(&[5, 3, 8, 1]);
    assert!(tree.access(&8));
    assert_eq!(tree.root_key(), Some(&8));
    assert!(tree.access(&1));
    assert_eq!(tree.root_key(), Some(&1));
    assert!(!tree.access(&4));
    assert_eq!(tree.root_key(), Some(&1));
    tree.validate().unwrap();
}

#[test]
fn zig_zag_lifts_inner_grandchild() {
    let mut tree = tree_with(&[3, 5]);
    let before = tree.stats().rotations;
    tree.insert(4);
    assert_eq!(tree.root_key(), Some(&4));
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.stats().rotations - before, 2);
}

#[test]
fn zig_zig_rotates_parent_first() {
    // ascending inserts leave a left chain 3 -> 2 -> 1
    let mut tree = tree_with(&[1, 2, 3]);
    assert!(tree.access(&1));
    assert_eq!(tree.root_key(), Some(&1));
    // zig-zig keeps the old root two levels down on the right spine
    assert_eq!(tree.height(), 3);
    assert_eq!(tree.values(), vec![1, 2, 3]);
    tree.validate().unwrap();
}

#[test]
fn duplicate_insert_and_absent_delete_are_noops() {
    let mut tree = tree_with(&[4, 2, 6]);
    let splays = tree.stats().splays;
    tree.insert(4);
    tree.delete(&5);
    assert_eq!(tree.values(), vec![2, 4, 6]);
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.stats().splays, splays);
    tree.validate().unwrap();
}

#[test]
fn delete_joins_through_predecessor() {
    let keys: Vec<i64> = (1..=7).collect();
    let mut tree = tree_with(&keys);
    tree.delete(&4);
    assert_eq!(tree.root_key(), Some(&3));
    assert_eq!(tree.values(), vec![1, 2, 3, 5, 6, 7]);
    tree.validate().unwrap();
}

#[test]
fn delete_without_left_subtree_promotes_right() {
    let mut tree = tree_with(&[1, 2]);
    tree.delete(&1);
    assert_eq!(tree.root_key(), Some(&2));
    assert_eq!(tree.values(), vec![2]);
    tree.validate().unwrap();

    tree.delete(&2);
    assert!(tree.is_empty());
    assert_eq!(tree.root_key(), None);
    tree.validate().unwrap();
}

#[test]
fn linear_chain_is_handled_without_recursion() {
    let keys: Vec<i64> = (0..100_000).collect();
    let mut tree = SplayTree::new();
    for &key in &keys {
        tree.insert(key);
    }
    assert_eq!(tree.height(), keys.len());
    assert_eq!(tree.values(), keys);
    tree.validate().unwrap();

    tree.delete(&0);
    assert!(!tree.has(&0));
    assert!(tree.height() < keys.len());
    assert!(tree.access(&1));
    assert_eq!(tree.root_key(), Some(&1));
    tree.validate().unwrap();
}

#[test]
fn randomized_insert_delete_matches_reference() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5B1A_7EE5);
    for _ in 0..10 {
        let mut keys: Vec<i64> = (-1000..1000).collect();
        keys.shuffle(&mut rng);
        let mut pending: Vec<i64> = keys[..600].to_vec();
        keys.shuffle(&mut rng);

        let mut tree = SplayTree::new();
        let mut expected = BTreeSet::new();
        for key in keys {
            tree.insert(key);
            expected.insert(key);
            while let Some(&next) = pending.last() {
                if !tree.has(&next) {
                    break;
                }
                pending.pop();
                tree.delete(&next);
                expected.remove(&next);
            }
            tree.assert_valid();
            assert_eq!(tree.values(), expected.iter().copied().collect::<Vec<_>>());
        }
    }
}
