//! Splay tree.
//!
//! There is no stored balance information. Every insertion and deletion
//! splays the touched key to the root, which gives amortized logarithmic cost
//! over any sequence of operations while a single operation may walk a linear
//! chain. All walks are iterative for that reason.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::arena::{Arena, NodeId, Side};
use crate::error::InvariantViolation;
use crate::set::OrderedSet;
use crate::stats::{TreeStats, TreeStatsSnapshot};

enum Descent {
    Found(NodeId),
    Vacant(Option<NodeId>),
}

/// Splay-tree ordered set.
#[derive(Debug, Clone)]
pub struct SplayTree<K> {
    arena: Arena<K, ()>,
    stats: TreeStats,
}

impl<K> Default for SplayTree<K> {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            stats: TreeStats::default(),
        }
    }
}

impl<K: Ord + Clone + Debug> SplayTree<K> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key stored at the root, i.e. the most recently splayed key.
    pub fn root_key(&self) -> Option<&K> {
        self.arena.root.map(|id| self.arena.key(id))
    }

    /// Length of the longest root-to-node path, counting nodes.
    pub fn height(&self) -> usize {
        self.arena.height()
    }

    /// Looks `key` up and, when present, splays it to the root.
    ///
    /// Unlike [`OrderedSet::has`] this restructures the tree, so repeated
    /// accesses to a hot key become cheap.
    pub fn access(&mut self, key: &K) -> bool {
        let mut path = Vec::new();
        match self.descend(key, &mut path) {
            Descent::Found(id) => {
                self.splay(id, path);
                true
            }
            Descent::Vacant(_) => false,
        }
    }

    /// Walks from the root towards `key`, recording the side taken at each step.
    fn descend(&self, key: &K, path: &mut Vec<Side>) -> Descent {
        let mut parent = None;
        let mut current = self.arena.root;
        while let Some(id) = current {
            let side = match key.cmp(self.arena.key(id)) {
                Ordering::Equal => return Descent::Found(id),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            path.push(side);
            parent = Some(id);
            current = self.arena.child(id, side);
        }
        Descent::Vacant(parent)
    }

    /// Replays `path` bottom-up, lifting `node` to the root of the tree.
    fn splay(&mut self, node: NodeId, mut path: Vec<Side>) {
        if path.is_empty() {
            return;
        }
        self.stats.inc_splays();

        while let Some(last) = path.pop() {
            match path.last() {
                // zig
                None => self.rotate(node),
                // zig-zig
                Some(&previous) if previous == last => {
                    let Some(parent) = self.arena.parent(node) else {
                        unreachable!("zig-zig step without a parent");
                    };
                    self.rotate(parent);
                    self.rotate(node);
                    path.pop();
                }
                // zig-zag
                Some(_) => {
                    self.rotate(node);
                    self.rotate(node);
                    path.pop();
                }
            }
        }
    }

    fn rotate(&mut self, id: NodeId) {
        self.arena.rotate_up(id);
        self.stats.inc_rotations();
    }

    /// Maximum of the subtree at `id` and the path leading to it.
    fn max_path(&self, mut id: NodeId) -> (NodeId, Vec<Side>) {
        let mut path = Vec::new();
        while let Some(right) = self.arena.right(id) {
            path.push(Side::Right);
            id = right;
        }
        (id, path)
    }
}

impl<K: Ord + Clone + Debug> OrderedSet<K> for SplayTree<K> {
    fn insert(&mut self, key: K) {
        let mut path = Vec::new();
        let parent = match self.descend(&key, &mut path) {
            Descent::Found(_) => return,
            Descent::Vacant(parent) => parent,
        };

        let id = self.arena.alloc(key, ());
        match (parent, path.last()) {
            (Some(parent), Some(&side)) => self.arena.set_child(parent, side, Some(id)),
            _ => self.arena.set_root(Some(id)),
        }
        self.splay(id, path);

        #[cfg(feature = "verify-mutations")]
        self.assert_valid();
    }

    fn delete(&mut self, key: &K) {
        let mut path = Vec::new();
        let Descent::Found(id) = self.descend(key, &mut path) else {
            return;
        };
        self.splay(id, path);

        match (self.arena.left(id), self.arena.right(id)) {
            (None, right) => self.arena.set_root(right),
            (left, None) => self.arena.set_root(left),
            (Some(left), Some(right)) => {
                self.arena.set_root(Some(left));
                let (max, path) = self.max_path(left);
                self.splay(max, path);
                self.arena.set_child(max, Side::Right, Some(right));
            }
        }
        self.arena.release(id);

        #[cfg(feature = "verify-mutations")]
        self.assert_valid();
    }

    fn has(&self, key: &K) -> bool {
        self.arena.find(key).is_some()
    }

    fn values(&self) -> Vec<K> {
        self.arena.keys_in_order()
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        self.arena.check_structure()
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn stats(&self) -> TreeStatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests;
