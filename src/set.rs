//! The ordered-set contract shared by every engine, plus the engine factory.

use std::fmt::{self, Debug};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::btree::BTree;
use crate::error::{InvariantViolation, Result, TreeError};
use crate::redblack::RedBlackTree;
use crate::splay::SplayTree;
use crate::stats::TreeStatsSnapshot;

/// A dynamic set of unique, totally ordered keys.
///
/// All engines behave identically from the caller's perspective: inserting a
/// present key and deleting an absent key are no-ops, and `values` always
/// returns the keys in ascending order.
pub trait OrderedSet<K: Ord + Clone + Debug> {
    /// Adds `key` unless it is already present.
    fn insert(&mut self, key: K);

    /// Removes `key` if present.
    fn delete(&mut self, key: &K);

    /// Returns whether `key` is present.
    fn has(&self, key: &K) -> bool;

    /// Materializes every key in ascending order.
    fn values(&self) -> Vec<K>;

    /// Checks every structural invariant of the engine.
    fn validate(&self) -> std::result::Result<(), InvariantViolation>;

    /// Number of keys currently stored.
    fn len(&self) -> usize;

    /// Returns true when no keys are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Structural counters accumulated so far.
    fn stats(&self) -> TreeStatsSnapshot;

    /// Validates and aborts on a broken invariant.
    ///
    /// A violation means the rebalancing code is wrong, so there is nothing to
    /// recover: the diagnostic is logged and the process panics.
    fn assert_valid(&self) {
        if let Err(violation) = self.validate() {
            tracing::error!(%violation, len = self.len(), "ordered set invariant violated");
            panic!("ordered set invariant violated: {violation}");
        }
    }
}

/// Engine selector used by the workload driver and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TreeKind {
    /// Splay tree.
    Splay,
    /// Red-black tree.
    RedBlack,
    /// B-tree with minimum degree `order`.
    BTree {
        /// Minimum degree `d`; non-root nodes have between `d` and `2d` children.
        order: usize,
    },
}

impl TreeKind {
    /// The set of trees compared by the default benchmark.
    pub fn defaults() -> Vec<TreeKind> {
        vec![
            TreeKind::Splay,
            TreeKind::RedBlack,
            TreeKind::BTree { order: 2 },
            TreeKind::BTree { order: 4 },
            TreeKind::BTree { order: 8 },
        ]
    }

    /// Constructs an empty engine of this kind over `i64` keys.
    pub fn build(self) -> Result<Box<dyn OrderedSet<i64>>> {
        Ok(match self {
            TreeKind::Splay => Box::new(SplayTree::new()),
            TreeKind::RedBlack => Box::new(RedBlackTree::new()),
            TreeKind::BTree { order } => Box::new(BTree::new(order)?),
        })
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeKind::Splay => f.write_str("splay"),
            TreeKind::RedBlack => f.write_str("red-black"),
            TreeKind::BTree { order: 2 } => f.write_str("2-3-4"),
            TreeKind::BTree { order } => write!(f, "btree:{order}"),
        }
    }
}

impl FromStr for TreeKind {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "splay" => Ok(TreeKind::Splay),
            "red-black" | "redblack" | "rb" => Ok(TreeKind::RedBlack),
            "2-3-4" => Ok(TreeKind::BTree { order: 2 }),
            _ => {
                let order = name
                    .strip_prefix("btree:")
                    .and_then(|d| d.parse::<usize>().ok())
                    .ok_or_else(|| TreeError::UnknownTreeKind(s.to_string()))?;
                if order < 2 {
                    return Err(TreeError::InvalidOrder(order));
                }
                Ok(TreeKind::BTree { order })
            }
        }
    }
}

impl TryFrom<String> for TreeKind {
    type Error = TreeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TreeKind> for String {
    fn from(kind: TreeKind) -> Self {
        kind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_kind_names_round_trip() {
        for kind in TreeKind::defaults() {
            let parsed: TreeKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!("btree:2".parse::<TreeKind>().unwrap(), TreeKind::BTree { order: 2 });
        assert_eq!("RB".parse::<TreeKind>().unwrap(), TreeKind::RedBlack);
    }

    #[test]
    fn tree_kind_rejects_bad_names() {
        assert!(matches!(
            "avl".parse::<TreeKind>(),
            Err(TreeError::UnknownTreeKind(_))
        ));
        assert!(matches!(
            "btree:1".parse::<TreeKind>(),
            Err(TreeError::InvalidOrder(1))
        ));
    }

    #[test]
    fn factory_builds_empty_valid_sets() {
        for kind in TreeKind::defaults() {
            let mut set = kind.build().unwrap();
            assert!(set.is_empty());
            set.insert(3);
            set.insert(1);
            set.delete(&3);
            assert_eq!(set.values(), vec![1]);
            set.assert_valid();
        }
    }
}
