use serde::Serialize;

/// Snapshot of structural work performed by a tree since construction.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeStatsSnapshot {
    /// Number of leaf node splits performed
    pub leaf_splits: u64,
    /// Number of internal node splits performed
    pub internal_splits: u64,
    /// Number of splits that grew the tree by a new root
    pub root_splits: u64,
    /// Number of keys rotated through a parent from a sibling
    pub borrows: u64,
    /// Number of sibling fuses
    pub fuses: u64,
    /// Number of keyless roots replaced by their only child
    pub root_collapses: u64,
    /// Number of single rotations
    pub rotations: u64,
    /// Number of color flips applied to a cluster or during delete fix-up
    pub recolors: u64,
    /// Number of splay operations
    pub splays: u64,
}

/// Structural counters owned by a single tree.
///
/// Trees are single-threaded and only count during `&mut self` operations, so
/// plain integers are enough.
#[derive(Default, Debug, Clone)]
pub struct TreeStats {
    leaf_splits: u64,
    internal_splits: u64,
    root_splits: u64,
    borrows: u64,
    fuses: u64,
    root_collapses: u64,
    rotations: u64,
    recolors: u64,
    splays: u64,
}

impl TreeStats {
    pub(crate) fn inc_splits(&mut self, leaf: bool) {
        if leaf {
            self.leaf_splits += 1;
        } else {
            self.internal_splits += 1;
        }
    }

    pub(crate) fn inc_root_splits(&mut self) {
        self.root_splits += 1;
    }

    pub(crate) fn inc_borrows(&mut self) {
        self.borrows += 1;
    }

    pub(crate) fn inc_fuses(&mut self) {
        self.fuses += 1;
    }

    pub(crate) fn inc_root_collapses(&mut self) {
        self.root_collapses += 1;
    }

    pub(crate) fn inc_rotations(&mut self) {
        self.rotations += 1;
    }

    pub(crate) fn inc_recolors(&mut self) {
        self.recolors += 1;
    }

    pub(crate) fn inc_splays(&mut self) {
        self.splays += 1;
    }

    /// Creates a snapshot of all current statistics.
    pub fn snapshot(&self) -> TreeStatsSnapshot {
        TreeStatsSnapshot {
            leaf_splits: self.leaf_splits,
            internal_splits: self.internal_splits,
            root_splits: self.root_splits,
            borrows: self.borrows,
            fuses: self.fuses,
            root_collapses: self.root_collapses,
            rotations: self.rotations,
            recolors: self.recolors,
            splays: self.splays,
        }
    }
}

impl TreeStatsSnapshot {
    /// Emits current statistics to the tracing infrastructure.
    pub fn emit_tracing(&self, tree: &str) {
        tracing::info!(
            target: "ordtrees::stats",
            tree,
            leaf_splits = self.leaf_splits,
            internal_splits = self.internal_splits,
            root_splits = self.root_splits,
            borrows = self.borrows,
            fuses = self.fuses,
            root_collapses = self.root_collapses,
            rotations = self.rotations,
            recolors = self.recolors,
            splays = self.splays,
            "tree stats snapshot"
        );
    }
}
