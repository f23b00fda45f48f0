//! Ordered-set engines over unique, totally ordered keys.
//!
//! Three interchangeable implementations of [`OrderedSet`]:
//!
//! * [`BTree`]: multi-way tree of minimum degree `d`, rebalanced by split,
//!   borrow and fuse.
//! * [`RedBlackTree`]: binary tree rebalanced by rotations and recoloring.
//! * [`SplayTree`]: binary tree that moves every touched key to the root.
//!
//! The [`workload`] module drives them with seeded permutations for timing
//! and for reference-checked stress runs.

#![warn(missing_docs)]

mod arena;
pub mod btree;
pub mod config;
pub mod error;
pub mod logging;
pub mod redblack;
pub mod set;
pub mod splay;
pub mod stats;
pub mod workload;

pub use btree::BTree;
pub use error::{InvariantViolation, Result, TreeError};
pub use redblack::{Color, RedBlackTree};
pub use set::{OrderedSet, TreeKind};
pub use splay::SplayTree;
pub use stats::TreeStatsSnapshot;
pub use workload::{Experiment, WorkloadOptions};
