use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the workload driver, configuration and logging layers.
pub type Result<T> = std::result::Result<T, TreeError>;

/// A structural invariant that `validate()` found broken.
///
/// Any of these indicates a defect in the rebalancing code, never bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// In-order traversal is not strictly ascending.
    #[error("keys out of order: {before} is not below {after}")]
    KeysOutOfOrder { before: String, after: String },
    /// Internal node whose child count is not its key count plus one.
    #[error("node with {keys} keys has {children} children")]
    KeyChildMismatch { keys: usize, children: usize },
    /// B-tree leaves found at different depths.
    #[error("leaves at unequal depths: {expected} and {found}")]
    UnevenLeafDepth { expected: usize, found: usize },
    #[error("node degree {degree} outside [{min}, {max}]")]
    DegreeOutOfBounds { degree: usize, min: usize, max: usize },
    #[error("internal root has degree {degree}, expected at least 2")]
    RootDegree { degree: usize },
    /// Red-black root colored red.
    #[error("root {key} is red")]
    RedRoot { key: String },
    #[error("red node {child} has red parent {parent}")]
    RedRedEdge { parent: String, child: String },
    /// Two paths below a node cross different numbers of black nodes.
    #[error("black height {found} below {key}, expected {expected}")]
    BlackHeightMismatch {
        key: String,
        expected: usize,
        found: usize,
    },
    #[error("parent link of {key} is inconsistent")]
    BrokenParentLink { key: String },
    #[error("tree reports {reported} keys but holds {found}")]
    LengthMismatch { reported: usize, found: usize },
}

/// Failures outside the engines themselves.
#[derive(Debug, Error)]
pub enum TreeError {
    /// B-tree minimum degree below 2.
    #[error("invalid B-tree order {0}: must be at least 2")]
    InvalidOrder(usize),
    /// Tree name that does not map to an engine.
    #[error("unknown tree kind `{0}` (expected splay, red-black, 2-3-4 or btree:<d>)")]
    UnknownTreeKind(String),
    /// Delete fraction outside `[0, 1]`.
    #[error("delete fraction {0} outside [0, 1]")]
    InvalidDeleteFraction(f64),
    /// Unknown experiment name.
    #[error("unknown experiment `{0}`")]
    UnknownExperiment(String),
    /// Config file exists but could not be read.
    #[error("failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid TOML for this schema.
    #[error("failed to parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// A structural check failed while running a verified workload.
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    /// Log filter rejected or subscriber already installed.
    #[error("invalid log filter: {0}")]
    Logging(String),
}
