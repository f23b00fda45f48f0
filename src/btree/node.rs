use crate::stats::TreeStats;

/// Result of splitting an overfull node: the promoted separator and the new
/// right sibling. The split node itself keeps the left half.
pub(super) struct Split<K> {
    pub(super) separator: K,
    pub(super) right: Box<Node<K>>,
}

/// A B-tree node. Leaves have no children; internal nodes always hold exactly
/// one more child than keys.
///
/// Key and child storage is reserved once at the maximum transient size
/// (`2d` keys, `2d + 1` children) and only edited by index afterwards.
#[derive(Debug, Clone)]
pub(super) struct Node<K> {
    pub(super) keys: Vec<K>,
    #[allow(clippy::vec_box)]
    pub(super) children: Vec<Box<Node<K>>>,
}

impl<K: Ord + Clone> Node<K> {
    pub(super) fn new(order: usize, is_leaf: bool) -> Self {
        Self {
            keys: Vec::with_capacity(2 * order),
            children: if is_leaf {
                Vec::new()
            } else {
                Vec::with_capacity(2 * order + 1)
            },
        }
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(super) fn degree(&self) -> usize {
        self.keys.len() + 1
    }

    /// Bottom-up insertion. Returns a split when this node overflowed and the
    /// caller has to absorb the separator; `None` ends the fix-up.
    pub(super) fn insert(
        &mut self,
        key: K,
        order: usize,
        stats: &mut TreeStats,
    ) -> Option<Split<K>> {
        let idx = match self.keys.binary_search(&key) {
            Ok(_) => return None,
            Err(idx) => idx,
        };

        if self.is_leaf() {
            self.keys.insert(idx, key);
        } else {
            let split = self.children[idx].insert(key, order, stats)?;
            self.absorb(idx, split);
        }

        if self.degree() > 2 * order {
            Some(self.split(order, stats))
        } else {
            None
        }
    }

    /// Splits around the key at `⌊k/2⌋`, keeping the left half in place.
    fn split(&mut self, order: usize, stats: &mut TreeStats) -> Split<K> {
        let leaf = self.is_leaf();
        let mid = self.keys.len() / 2;
        let mut right = Node::new(order, leaf);

        right.keys.extend(self.keys.drain(mid + 1..));
        if !leaf {
            right.children.extend(self.children.drain(mid + 1..));
        }
        let Some(separator) = self.keys.pop() else {
            unreachable!("split of a node without keys");
        };

        stats.inc_splits(leaf);
        tracing::trace!(
            leaf,
            left_keys = self.keys.len(),
            right_keys = right.keys.len(),
            "split overfull node"
        );
        Split {
            separator,
            right: Box::new(right),
        }
    }

    /// Takes a split child at `idx`: the child already holds the left half.
    fn absorb(&mut self, idx: usize, split: Split<K>) {
        self.keys.insert(idx, split.separator);
        self.children.insert(idx + 1, split.right);
    }

    /// Top-down deletion. The caller guarantees that this node can lose a key
    /// (it is the root or has degree above the minimum).
    pub(super) fn delete(&mut self, key: &K, order: usize, stats: &mut TreeStats) {
        match self.keys.binary_search(key) {
            Ok(idx) => {
                if self.is_leaf() {
                    self.keys.remove(idx);
                    return;
                }

                let left_degree = self.children[idx].degree();
                let right_degree = self.children[idx + 1].degree();
                if left_degree == order && right_degree == order {
                    self.fuse(idx, stats);
                    self.children[idx].delete(key, order, stats);
                } else if left_degree > order {
                    let pred = self.children[idx].max_key();
                    self.children[idx].delete(&pred, order, stats);
                    self.keys[idx] = pred;
                } else {
                    let succ = self.children[idx + 1].min_key();
                    self.children[idx + 1].delete(&succ, order, stats);
                    self.keys[idx] = succ;
                }
            }
            Err(idx) => {
                if self.is_leaf() {
                    return;
                }

                let target = if self.children[idx].degree() == order {
                    self.fix_child(idx, order, stats)
                } else {
                    idx
                };
                self.children[target].delete(key, order, stats);
            }
        }
    }

    /// Gives the minimum-degree child at `idx` a spare key, borrowing from a
    /// sibling when one can spare it and fusing otherwise. Returns the index of
    /// the child that now covers the original key range.
    fn fix_child(&mut self, idx: usize, order: usize, stats: &mut TreeStats) -> usize {
        if idx > 0 && self.children[idx - 1].degree() > order {
            self.borrow_from_left(idx, stats);
            idx
        } else if idx + 1 < self.children.len() && self.children[idx + 1].degree() > order {
            self.borrow_from_right(idx, stats);
            idx
        } else if idx > 0 {
            self.fuse(idx - 1, stats);
            idx - 1
        } else {
            self.fuse(idx, stats);
            idx
        }
    }

    fn borrow_from_left(&mut self, idx: usize, stats: &mut TreeStats) {
        let (left_part, right_part) = self.children.split_at_mut(idx);
        let left_sibling = &mut left_part[idx - 1];
        let child = &mut right_part[0];

        let Some(borrowed_key) = left_sibling.keys.pop() else {
            unreachable!("borrow from a sibling without spare keys");
        };
        let separator = std::mem::replace(&mut self.keys[idx - 1], borrowed_key);
        child.keys.insert(0, separator);

        if !child.is_leaf() {
            if let Some(borrowed_child) = left_sibling.children.pop() {
                child.children.insert(0, borrowed_child);
            }
        }
        stats.inc_borrows();
        tracing::trace!(idx, "borrowed key from left sibling");
    }

    fn borrow_from_right(&mut self, idx: usize, stats: &mut TreeStats) {
        let (left_part, right_part) = self.children.split_at_mut(idx + 1);
        let child = &mut left_part[idx];
        let right_sibling = &mut right_part[0];

        let borrowed_key = right_sibling.keys.remove(0);
        let separator = std::mem::replace(&mut self.keys[idx], borrowed_key);
        child.keys.push(separator);

        if !child.is_leaf() {
            child.children.push(right_sibling.children.remove(0));
        }
        stats.inc_borrows();
        tracing::trace!(idx, "borrowed key from right sibling");
    }

    /// Merges the children at `idx` and `idx + 1` around their separator.
    fn fuse(&mut self, idx: usize, stats: &mut TreeStats) {
        let separator = self.keys.remove(idx);
        let right = *self.children.remove(idx + 1);
        let left = &mut self.children[idx];

        left.keys.push(separator);
        left.keys.extend(right.keys);
        left.children.extend(right.children);

        stats.inc_fuses();
        tracing::trace!(idx, fused_keys = left.keys.len(), "fused siblings");
    }

    fn max_key(&self) -> K {
        let mut current = self;
        while let Some(last) = current.children.last() {
            current = last;
        }
        let Some(key) = current.keys.last() else {
            unreachable!("non-root leaf without keys");
        };
        key.clone()
    }

    fn min_key(&self) -> K {
        let mut current = self;
        while let Some(first) = current.children.first() {
            current = first;
        }
        let Some(key) = current.keys.first() else {
            unreachable!("non-root leaf without keys");
        };
        key.clone()
    }

    pub(super) fn collect_keys(&self, result: &mut Vec<K>) {
        if self.is_leaf() {
            result.extend(self.keys.iter().cloned());
            return;
        }
        for (child, key) in self.children.iter().zip(&self.keys) {
            child.collect_keys(result);
            result.push(key.clone());
        }
        if let Some(last) = self.children.last() {
            last.collect_keys(result);
        }
    }
}
