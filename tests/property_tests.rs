#![allow(missing_docs)]

use std::collections::BTreeSet;

use ordtrees::{BTree, OrderedSet, RedBlackTree, SplayTree};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    Insert(i64),
    Delete(i64),
    Has(i64),
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (-200i64..200).prop_map(Operation::Insert),
        2 => (-200i64..200).prop_map(Operation::Delete),
        1 => (-200i64..200).prop_map(Operation::Has),
    ]
}

fn check_against_reference(
    tree: &mut dyn OrderedSet<i64>,
    ops: &[Operation],
) -> Result<(), TestCaseError> {
    let mut reference = BTreeSet::new();
    for op in ops {
        match *op {
            Operation::Insert(key) => {
                tree.insert(key);
                reference.insert(key);
            }
            Operation::Delete(key) => {
                tree.delete(&key);
                reference.remove(&key);
            }
            Operation::Has(key) => {
                prop_assert_eq!(tree.has(&key), reference.contains(&key));
            }
        }
        if let Err(violation) = tree.validate() {
            return Err(TestCaseError::fail(format!("after {op:?}: {violation}")));
        }
        prop_assert_eq!(tree.len(), reference.len());
    }
    prop_assert_eq!(tree.values(), reference.into_iter().collect::<Vec<_>>());
    Ok(())
}

proptest! {
    #[test]
    fn prop_btree_matches_reference(
        order in 2usize..=6,
        ops in prop::collection::vec(arb_operation(), 1..400),
    ) {
        let mut tree = BTree::new(order).unwrap();
        check_against_reference(&mut tree, &ops)?;
    }

    #[test]
    fn prop_red_black_matches_reference(ops in prop::collection::vec(arb_operation(), 1..400)) {
        let mut tree = RedBlackTree::new();
        check_against_reference(&mut tree, &ops)?;
    }

    #[test]
    fn prop_splay_matches_reference(ops in prop::collection::vec(arb_operation(), 1..400)) {
        let mut tree = SplayTree::new();
        check_against_reference(&mut tree, &ops)?;
    }

    #[test]
    fn prop_duplicate_insert_is_idempotent(keys in prop::collection::vec(any::<i64>(), 1..100)) {
        let mut engines: Vec<Box<dyn OrderedSet<i64>>> = vec![
            Box::new(BTree::new(2).unwrap()),
            Box::new(RedBlackTree::new()),
            Box::new(SplayTree::new()),
        ];
        for tree in engines.iter_mut() {
            for &key in &keys {
                tree.insert(key);
            }
            let once = tree.values();
            for &key in &keys {
                tree.insert(key);
            }
            prop_assert_eq!(tree.values(), once);
        }
    }

    #[test]
    fn prop_splay_access_moves_key_to_root(
        keys in prop::collection::btree_set(-1000i64..1000, 1..200),
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<i64> = keys.into_iter().collect();
        let mut tree = SplayTree::new();
        for &key in keys.iter().rev() {
            tree.insert(key);
        }
        let target = keys[pick.index(keys.len())];
        prop_assert!(tree.access(&target));
        prop_assert_eq!(tree.root_key(), Some(&target));
        prop_assert_eq!(tree.values(), keys);
    }
}
