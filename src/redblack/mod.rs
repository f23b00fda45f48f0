//! Red-black tree.
//!
//! Insertion repairs violations by looking at 2-3-4 clusters: a black node
//! together with its red children and grandchildren. An overfull cluster is
//! split by recoloring and the repair moves up; a cluster with a single red
//! chain is rebalanced with one or two rotations and the repair ends.
//!
//! Deletion splices out a node with at most one child (the in-order successor
//! when the target has two) and, when the spliced node was black, runs the
//! double-black fix-up.

use std::fmt::{self, Debug};

use serde::Serialize;

use crate::arena::{Arena, NodeId, Side};
use crate::error::InvariantViolation;
use crate::set::OrderedSet;
use crate::stats::{TreeStats, TreeStatsSnapshot};

/// Node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Color {
    /// Red node: never the root, never the child of another red node.
    Red,
    /// Black node: counted by the black-height.
    Black,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => f.write_str("red"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Red-black ordered set.
#[derive(Debug, Clone)]
pub struct RedBlackTree<K> {
    arena: Arena<K, Color>,
    stats: TreeStats,
}

impl<K> Default for RedBlackTree<K> {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            stats: TreeStats::default(),
        }
    }
}

impl<K: Ord + Clone + Debug> RedBlackTree<K> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key stored at the root.
    pub fn root_key(&self) -> Option<&K> {
        self.arena.root.map(|id| self.arena.key(id))
    }

    /// Color of the node holding `key`, if present.
    pub fn color_of(&self, key: &K) -> Option<Color> {
        self.arena.find(key).map(|id| self.arena.node(id).meta)
    }

    /// Length of the longest root-to-node path, counting nodes.
    pub fn height(&self) -> usize {
        self.arena.height()
    }

    fn color(&self, id: Option<NodeId>) -> Color {
        match id {
            Some(id) => self.arena.node(id).meta,
            None => Color::Black,
        }
    }

    fn is_red(&self, id: Option<NodeId>) -> bool {
        self.color(id) == Color::Red
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        self.arena.node_mut(id).meta = color;
    }

    fn rotate(&mut self, id: NodeId) {
        self.arena.rotate_up(id);
        self.stats.inc_rotations();
    }

    /// The black node heading the cluster that `id` belongs to, or `None`
    /// when `id` is a red root.
    fn cluster_root(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_red(Some(id)) {
            return Some(id);
        }
        let parent = self.arena.parent(id)?;
        if !self.is_red(Some(parent)) {
            return Some(parent);
        }
        match self.arena.parent(parent) {
            Some(grandparent) if !self.is_red(Some(grandparent)) => Some(grandparent),
            _ => panic!(
                "red-black insert: {:?} has red parent and red or missing grandparent",
                self.arena.key(id)
            ),
        }
    }

    /// Removes any red grandchild from the cluster rooted at `top` and returns
    /// the node the repair continues from.
    fn adjust_cluster(&mut self, top: NodeId) -> NodeId {
        let red_left = self.arena.left(top).filter(|&id| self.is_red(Some(id)));
        let red_right = self.arena.right(top).filter(|&id| self.is_red(Some(id)));

        match (red_left, red_right) {
            (Some(left), Some(right)) => {
                let grandchildren = [
                    self.arena.left(left),
                    self.arena.right(left),
                    self.arena.left(right),
                    self.arena.right(right),
                ];
                if grandchildren.into_iter().any(|g| self.is_red(g)) {
                    self.set_color(top, Color::Red);
                    self.set_color(left, Color::Black);
                    self.set_color(right, Color::Black);
                    self.stats.inc_recolors();
                    tracing::trace!(key = ?self.arena.key(top), "split overfull cluster by recoloring");
                }
                top
            }
            (Some(red), None) => self.rebalance_chain(top, red, Side::Left),
            (None, Some(red)) => self.rebalance_chain(top, red, Side::Right),
            (None, None) => top,
        }
    }

    /// `red` is the only red child of `top`, hanging on `side`. A red child of
    /// `red` is lifted with a single rotation when it is on the outer side and
    /// a double rotation when it is on the inner side.
    fn rebalance_chain(&mut self, top: NodeId, red: NodeId, side: Side) -> NodeId {
        let outer = self.arena.child(red, side).filter(|&id| self.is_red(Some(id)));
        let inner = self
            .arena
            .child(red, side.opposite())
            .filter(|&id| self.is_red(Some(id)));

        let new_top = match (outer, inner) {
            (Some(_), Some(_)) => panic!(
                "red-black insert: red node {:?} has two red children",
                self.arena.key(red)
            ),
            (Some(_), None) => {
                self.rotate(red);
                red
            }
            (None, Some(inner)) => {
                self.rotate(inner);
                self.rotate(inner);
                inner
            }
            (None, None) => return top,
        };

        self.set_color(new_top, Color::Black);
        self.set_color(top, Color::Red);
        tracing::trace!(key = ?self.arena.key(new_top), "rotated red chain into balanced cluster");
        new_top
    }

    /// Restores the black-height after a black node was spliced out from
    /// under `parent` on `side`, leaving `node` (possibly empty) in its place.
    fn delete_fixup(
        &mut self,
        mut node: Option<NodeId>,
        mut parent: Option<NodeId>,
        mut side: Side,
    ) {
        while let Some(p) = parent {
            if self.is_red(node) {
                break;
            }
            let far = side.opposite();
            let mut sibling = self.sibling(p, far);

            if self.is_red(Some(sibling)) {
                self.set_color(sibling, Color::Black);
                self.set_color(p, Color::Red);
                self.rotate(sibling);
                sibling = self.sibling(p, far);
            }

            let near_nephew = self.arena.child(sibling, side);
            let far_nephew = self.arena.child(sibling, far);
            if !self.is_red(near_nephew) && !self.is_red(far_nephew) {
                self.set_color(sibling, Color::Red);
                self.stats.inc_recolors();
                node = Some(p);
                parent = self.arena.parent(p);
                if let Some(next_side) = self.arena.side_of(p) {
                    side = next_side;
                }
                continue;
            }

            if !self.is_red(far_nephew) {
                if let Some(near) = near_nephew {
                    self.set_color(near, Color::Black);
                    self.set_color(sibling, Color::Red);
                    self.rotate(near);
                    sibling = self.sibling(p, far);
                }
            }

            let parent_color = self.color(Some(p));
            self.set_color(sibling, parent_color);
            self.set_color(p, Color::Black);
            if let Some(far_nephew) = self.arena.child(sibling, far) {
                self.set_color(far_nephew, Color::Black);
            }
            self.rotate(sibling);
            node = self.arena.root;
            parent = None;
        }

        if let Some(node) = node {
            self.set_color(node, Color::Black);
        }
    }

    fn sibling(&self, parent: NodeId, side: Side) -> NodeId {
        match self.arena.child(parent, side) {
            Some(sibling) => sibling,
            None => panic!(
                "red-black delete: double-black below {:?} has no sibling",
                self.arena.key(parent)
            ),
        }
    }

    fn check_colors(&self) -> Result<(), InvariantViolation> {
        if let Some(root) = self.arena.root {
            if self.is_red(Some(root)) {
                return Err(InvariantViolation::RedRoot {
                    key: format!("{:?}", self.arena.key(root)),
                });
            }
        }

        let mut expected: Option<usize> = None;
        let mut stack: Vec<(Option<NodeId>, Option<NodeId>, usize)> =
            vec![(self.arena.root, None, 0)];
        while let Some((node, parent, blacks_above)) = stack.pop() {
            let Some(id) = node else {
                match expected {
                    None => expected = Some(blacks_above),
                    Some(height) if height != blacks_above => {
                        return Err(InvariantViolation::BlackHeightMismatch {
                            key: parent
                                .map(|p| format!("{:?}", self.arena.key(p)))
                                .unwrap_or_else(|| "<root>".to_string()),
                            expected: height,
                            found: blacks_above,
                        });
                    }
                    Some(_) => {}
                }
                continue;
            };

            let red = self.is_red(Some(id));
            if red && self.is_red(parent) {
                if let Some(parent) = parent {
                    return Err(InvariantViolation::RedRedEdge {
                        parent: format!("{:?}", self.arena.key(parent)),
                        child: format!("{:?}", self.arena.key(id)),
                    });
                }
            }
            let blacks = blacks_above + usize::from(!red);
            stack.push((self.arena.left(id), Some(id), blacks));
            stack.push((self.arena.right(id), Some(id), blacks));
        }
        Ok(())
    }
}

impl<K: Ord + Clone + Debug> OrderedSet<K> for RedBlackTree<K> {
    fn insert(&mut self, key: K) {
        let Some(inserted) = self.arena.insert_leaf(key, Color::Red) else {
            return;
        };

        let mut current = Some(inserted);
        while let Some(id) = current {
            if !self.is_red(Some(id)) {
                break;
            }
            current = match self.cluster_root(id) {
                Some(top) => Some(self.adjust_cluster(top)),
                None => {
                    self.set_color(id, Color::Black);
                    None
                }
            };
        }

        #[cfg(feature = "verify-mutations")]
        self.assert_valid();
    }

    fn delete(&mut self, key: &K) {
        let Some(target) = self.arena.find(key) else {
            return;
        };

        let splice = match (self.arena.left(target), self.arena.right(target)) {
            (Some(_), Some(right)) => self.arena.min_node(right),
            _ => target,
        };
        let child = self.arena.left(splice).or(self.arena.right(splice));
        let parent = self.arena.parent(splice);
        let side = self.arena.side_of(splice).unwrap_or(Side::Left);
        let removed_black = !self.is_red(Some(splice));

        self.arena.replace_child(splice, child);
        let removed = self.arena.release(splice);
        if splice != target {
            self.arena.node_mut(target).key = removed.key;
        }

        if removed_black {
            self.delete_fixup(child, parent, side);
        }

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
        self.arena.check_structure()?;
        self.check_colors()
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn stats(&self) -> TreeStatsSnapshot {
        self.stats.snapshot()
    }
}
