//! Multi-way B-tree keyed by its minimum degree `d`.
//!
//! Insertion is bottom-up: the key lands in a leaf and overfull nodes split on
//! the way back to the root. Deletion is top-down: before descending into a
//! child at minimum degree the child is topped up by borrowing from a sibling
//! or fusing with one, so the final removal never underflows.

mod node;
mod validate;

use std::fmt::Debug;

use crate::error::{InvariantViolation, Result, TreeError};
use crate::set::OrderedSet;
use crate::stats::{TreeStats, TreeStatsSnapshot};
use node::Node;

/// B-tree ordered set. Every non-root node has between `d` and `2d` children.
#[derive(Debug, Clone)]
pub struct BTree<K> {
    root: Box<Node<K>>,
    order: usize,
    len: usize,
    stats: TreeStats,
}

impl<K: Ord + Clone + Debug> BTree<K> {
    /// Creates an empty tree with minimum degree `order`, which must be at
    /// least 2 (`order == 2` gives a 2-3-4 tree).
    pub fn new(order: usize) -> Result<Self> {
        if order < 2 {
            return Err(TreeError::InvalidOrder(order));
        }
        Ok(Self {
            root: Box::new(Node::new(order, true)),
            order,
            len: 0,
            stats: TreeStats::default(),
        })
    }

    /// Minimum degree `d`.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of levels, counting a lone root leaf as one.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &*self.root;
        while let Some(first) = node.children.first() {
            height += 1;
            node = first;
        }
        height
    }

    /// Keys held by the root node.
    pub fn root_keys(&self) -> &[K] {
        &self.root.keys
    }

    /// Keys of every node, level by level from the root.
    pub fn levels(&self) -> Vec<Vec<Vec<K>>> {
        let mut levels = Vec::new();
        let mut current: Vec<&Node<K>> = vec![&*self.root];
        while !current.is_empty() {
            levels.push(current.iter().map(|node| node.keys.clone()).collect());
            current = current
                .iter()
                .flat_map(|&node| node.children.iter().map(|child| &**child))
                .collect();
        }
        levels
    }

    fn collapse_root(&mut self) {
        if !self.root.keys.is_empty() || self.root.is_leaf() {
            return;
        }
        if let Some(child) = self.root.children.pop() {
            self.root = child;
            self.stats.inc_root_collapses();
            tracing::debug!(height = self.height(), "keyless root replaced by its child");
        }
    }
}

impl<K: Ord + Clone + Debug> OrderedSet<K> for BTree<K> {
    fn insert(&mut self, key: K) {
        if self.has(&key) {
            return;
        }
        if let Some(split) = self.root.insert(key, self.order, &mut self.stats) {
            let mut new_root = Node::new(self.order, false);
            new_root.keys.push(split.separator);
            let old_root = std::mem::replace(&mut self.root, Box::new(new_root));
            self.root.children.push(old_root);
            self.root.children.push(split.right);
            self.stats.inc_root_splits();
            tracing::debug!(height = self.height(), "root split");
        }
        self.len += 1;

        #[cfg(feature = "verify-mutations")]
        self.assert_valid();
    }

    fn delete(&mut self, key: &K) {
        if !self.has(key) {
            return;
        }
        self.root.delete(key, self.order, &mut self.stats);
        self.collapse_root();
        self.len -= 1;

        #[cfg(feature = "verify-mutations")]
        self.assert_valid();
    }

    fn has(&self, key: &K) -> bool {
        let mut node = &*self.root;
        loop {
            match node.keys.binary_search(key) {
                Ok(_) => return true,
                Err(idx) => match node.children.get(idx) {
                    Some(child) => node = child,
                    None => return false,
                },
            }
        }
    }

    fn values(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len);
        self.root.collect_keys(&mut keys);
        keys
    }

    fn validate(&self) -> std::result::Result<(), InvariantViolation> {
        validate::validate(&self.root, self.order, self.len)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn stats(&self) -> TreeStatsSnapshot {
        self.stats.snapshot()
    }
}
