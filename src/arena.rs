//! Index-based node storage for the binary search tree engines.
//!
//! Child links own their subtree; `parent` is a plain index used for
//! navigation during rotations and never for ownership. Every walk here is
//! iterative because a splay tree can legitimately degrade into a linear chain.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::InvariantViolation;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which child slot a node occupies, or which way a search stepped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BinaryNode<K, M> {
    pub(crate) key: K,
    pub(crate) meta: M,
    pub(crate) parent: Option<NodeId>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

/// Where a search for a key ended.
pub(crate) enum Search {
    Found(NodeId),
    /// Key absent; a new leaf belongs under `parent` on `side` (or at the root
    /// when `parent` is `None`).
    Vacant { parent: Option<NodeId>, side: Side },
}

#[derive(Debug, Clone)]
pub(crate) struct Arena<K, M> {
    slots: Vec<Option<BinaryNode<K, M>>>,
    free_list: Vec<u32>,
    pub(crate) root: Option<NodeId>,
    len: usize,
}

impl<K, M> Default for Arena<K, M> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: None,
            len: 0,
        }
    }
}

impl<K: Ord + Clone + Debug, M> Arena<K, M> {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn alloc(&mut self, key: K, meta: M) -> NodeId {
        let node = BinaryNode {
            key,
            meta,
            parent: None,
            left: None,
            right: None,
        };
        self.len += 1;
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(node);
            NodeId(idx)
        } else {
            let idx = u32::try_from(self.slots.len())
                .unwrap_or_else(|_| panic!("node arena exceeded u32::MAX slots"));
            self.slots.push(Some(node));
            NodeId(idx)
        }
    }

    /// Frees a node that has already been unlinked from the tree.
    pub(crate) fn release(&mut self, id: NodeId) -> BinaryNode<K, M> {
        let Some(node) = self.slots[id.index()].take() else {
            panic!("double release of arena slot {}", id.0);
        };
        self.free_list.push(id.0);
        self.len -= 1;
        node
    }

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &BinaryNode<K, M> {
        match &self.slots[id.index()] {
            Some(node) => node,
            None => panic!("dangling arena index {}", id.0),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut BinaryNode<K, M> {
        match &mut self.slots[id.index()] {
            Some(node) => node,
            None => panic!("dangling arena index {}", id.0),
        }
    }

    pub(crate) fn key(&self, id: NodeId) -> &K {
        &self.node(id).key
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub(crate) fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    pub(crate) fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    pub(crate) fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left(id),
            Side::Right => self.right(id),
        }
    }

    /// Side of `id` under its parent. `None` for the root.
    pub(crate) fn side_of(&self, id: NodeId) -> Option<Side> {
        let parent = self.parent(id)?;
        if self.left(parent) == Some(id) {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        }
    }

    /// Links `child` under `parent` on `side`, fixing the back-reference.
    pub(crate) fn set_child(&mut self, parent: NodeId, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.node_mut(parent).left = child,
            Side::Right => self.node_mut(parent).right = child,
        }
        if let Some(child) = child {
            self.node_mut(child).parent = Some(parent);
        }
    }

    /// Makes `node` the root, clearing its parent link.
    pub(crate) fn set_root(&mut self, node: Option<NodeId>) {
        self.root = node;
        if let Some(node) = node {
            self.node_mut(node).parent = None;
        }
    }

    /// Puts `new` where `old` hangs: under `old`'s parent, or at the root.
    pub(crate) fn replace_child(&mut self, old: NodeId, new: Option<NodeId>) {
        match (self.parent(old), self.side_of(old)) {
            (Some(parent), Some(side)) => self.set_child(parent, side, new),
            _ => self.set_root(new),
        }
    }

    pub(crate) fn search(&self, key: &K) -> Search {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(id) = current {
            match key.cmp(self.key(id)) {
                Ordering::Equal => return Search::Found(id),
                Ordering::Less => {
                    side = Side::Left;
                    current = self.left(id);
                }
                Ordering::Greater => {
                    side = Side::Right;
                    current = self.right(id);
                }
            }
            parent = Some(id);
        }
        Search::Vacant { parent, side }
    }

    pub(crate) fn find(&self, key: &K) -> Option<NodeId> {
        match self.search(key) {
            Search::Found(id) => Some(id),
            Search::Vacant { .. } => None,
        }
    }

    /// Places a fresh leaf by ordinary BST insertion. Returns `None` when the
    /// key is already present.
    pub(crate) fn insert_leaf(&mut self, key: K, meta: M) -> Option<NodeId> {
        let (parent, side) = match self.search(&key) {
            Search::Found(_) => return None,
            Search::Vacant { parent, side } => (parent, side),
        };
        let id = self.alloc(key, meta);
        match parent {
            Some(parent) => self.set_child(parent, side, Some(id)),
            None => self.set_root(Some(id)),
        }
        Some(id)
    }

    /// Rotates `x` above its parent, keeping in-order order. The subtree on
    /// `x`'s inner side moves across to the old parent.
    pub(crate) fn rotate_up(&mut self, x: NodeId) {
        let Some(parent) = self.parent(x) else {
            panic!("rotate_up on the root");
        };
        self.replace_child(parent, Some(x));
        if self.left(parent) == Some(x) {
            let inner = self.right(x);
            self.set_child(parent, Side::Left, inner);
            self.set_child(x, Side::Right, Some(parent));
        } else {
            let inner = self.left(x);
            self.set_child(parent, Side::Right, inner);
            self.set_child(x, Side::Left, Some(parent));
        }
    }

    pub(crate) fn min_node(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.left(id) {
            id = left;
        }
        id
    }

    pub(crate) fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|id| (id, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in [self.left(id), self.right(id)].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    pub(crate) fn keys_in_order(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len);
        let mut stack = Vec::new();
        let mut current = self.root;
        loop {
            while let Some(id) = current {
                stack.push(id);
                current = self.left(id);
            }
            let Some(id) = stack.pop() else {
                break;
            };
            keys.push(self.key(id).clone());
            current = self.right(id);
        }
        keys
    }

    /// Checks strict in-order ordering, parent back-links and the live count.
    pub(crate) fn check_structure(&self) -> Result<(), InvariantViolation> {
        if let Some(root) = self.root {
            if self.parent(root).is_some() {
                return Err(InvariantViolation::BrokenParentLink {
                    key: format!("{:?}", self.key(root)),
                });
            }
        }

        let mut seen = 0usize;
        let mut previous: Option<NodeId> = None;
        let mut stack = Vec::new();
        let mut current = self.root;
        loop {
            while let Some(id) = current {
                stack.push(id);
                current = self.left(id);
            }
            let Some(id) = stack.pop() else {
                break;
            };
            for child in [self.left(id), self.right(id)].into_iter().flatten() {
                if self.parent(child) != Some(id) {
                    return Err(InvariantViolation::BrokenParentLink {
                        key: format!("{:?}", self.key(child)),
                    });
                }
            }
            if let Some(prev) = previous {
                if self.key(prev) >= self.key(id) {
                    return Err(InvariantViolation::KeysOutOfOrder {
                        before: format!("{:?}", self.key(prev)),
                        after: format!("{:?}", self.key(id)),
                    });
                }
            }
            previous = Some(id);
            seen += 1;
            current = self.right(id);
        }

        if seen != self.len {
            return Err(InvariantViolation::LengthMismatch {
                reported: self.len,
                found: seen,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(keys: &[i32]) -> Arena<i32, ()> {
        let mut arena = Arena::default();
        for &key in keys {
            arena.insert_leaf(key, ());
        }
        arena
    }

    #[test]
    fn insert_leaf_builds_search_tree() {
        let arena = chain(&[5, 3, 8, 1, 4]);
        assert_eq!(arena.keys_in_order(), vec![1, 3, 4, 5, 8]);
        assert_eq!(arena.len(), 5);
        assert_eq!(arena.height(), 3);
        arena.check_structure().unwrap();
    }

    #[test]
    fn rotate_up_moves_inner_subtree() {
        let mut arena = chain(&[5, 3, 8, 1, 4]);
        let three = arena.find(&3).unwrap();
        arena.rotate_up(three);
        assert_eq!(arena.root, Some(three));
        let five = arena.find(&5).unwrap();
        assert_eq!(arena.right(three), Some(five));
        assert_eq!(arena.key(arena.left(five).unwrap()), &4);
        assert_eq!(arena.keys_in_order(), vec![1, 3, 4, 5, 8]);
        arena.check_structure().unwrap();
    }

    #[test]
    fn released_slots_are_reused() {
        let mut arena = chain(&[2, 1]);
        let one = arena.find(&1).unwrap();
        arena.replace_child(one, None);
        let node = arena.release(one);
        assert_eq!(node.key, 1);
        let id = arena.insert_leaf(7, ()).unwrap();
        assert_eq!(id, one);
        assert_eq!(arena.keys_in_order(), vec![2, 7]);
        arena.check_structure().unwrap();
    }

    #[test]
    fn duplicate_leaf_is_rejected() {
        let mut arena = chain(&[5, 3]);
        assert!(arena.insert_leaf(3, ()).is_none());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn deep_chain_is_walked_iteratively() {
        let keys: Vec<i32> = (0..200_000).collect();
        let mut arena: Arena<i32, ()> = Arena::default();
        let mut tail = None;
        for &key in &keys {
            let id = arena.alloc(key, ());
            match tail {
                Some(parent) => arena.set_child(parent, Side::Right, Some(id)),
                None => arena.set_root(Some(id)),
            }
            tail = Some(id);
        }
        assert_eq!(arena.height(), 200_000);
        assert_eq!(arena.keys_in_order(), keys);
        arena.check_structure().unwrap();
    }
}
