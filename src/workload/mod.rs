//! Seeded workloads that drive the engines.
//!
//! A workload is a shuffled permutation of `-n..n` fed through one of two
//! experiments. [`run`] times an experiment; [`verify`] replays it while
//! checking every step against a `BTreeSet` reference.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::set::{OrderedSet, TreeKind};
use crate::stats::TreeStatsSnapshot;

const MAX_FINDINGS: usize = 32;

/// Sizes measured by the default benchmark. Each size `n` yields `2n` keys.
pub const DEFAULT_SIZES: [usize; 9] = [100, 1000, 2000, 5000, 10000, 20000, 30000, 40000, 50000];

/// Share of the permutation scheduled for deletion by default.
pub const DEFAULT_DELETE_FRACTION: f64 = 0.5;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 0x0DD5_EED5;

/// Operation sequence applied to a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Experiment {
    /// Insert every key of the permutation in order.
    Insert,
    /// Insert every key; a prefix of the permutation is deleted again as soon
    /// as each of its keys is present, most recent first.
    InsertDeleteInsert,
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Experiment::Insert => f.write_str("insert"),
            Experiment::InsertDeleteInsert => f.write_str("insert-delete-insert"),
        }
    }
}

impl FromStr for Experiment {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "insert" => Ok(Experiment::Insert),
            "insert-delete-insert" => Ok(Experiment::InsertDeleteInsert),
            other => Err(TreeError::UnknownExperiment(other.to_string())),
        }
    }
}

/// A single mutation issued by an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "key", rename_all = "snake_case")]
pub enum Op {
    /// Insertion of a key.
    Insert(i64),
    /// Deletion of a key.
    Delete(i64),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Insert(key) => write!(f, "insert {key}"),
            Op::Delete(key) => write!(f, "delete {key}"),
        }
    }
}

/// Everything a benchmark needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadOptions {
    /// Permutation sizes; each size `n` produces the keys `-n..n`.
    pub sizes: Vec<usize>,
    /// Seed of the permutation generator.
    pub seed: u64,
    /// Share of each permutation deleted by [`Experiment::InsertDeleteInsert`].
    pub delete_fraction: f64,
    /// Engines to measure.
    pub trees: Vec<TreeKind>,
    /// Experiment to run.
    pub experiment: Experiment,
}

impl Default for WorkloadOptions {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            seed: DEFAULT_SEED,
            delete_fraction: DEFAULT_DELETE_FRACTION,
            trees: TreeKind::defaults(),
            experiment: Experiment::Insert,
        }
    }
}

/// Timing of one experiment on one engine.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Engine that was measured.
    pub tree: TreeKind,
    /// Experiment that was run.
    pub experiment: Experiment,
    /// Number of keys in the permutation.
    pub elements: usize,
    /// Wall-clock duration of the experiment.
    pub elapsed_secs: f64,
    /// Keys left in the tree afterwards.
    pub final_len: usize,
    /// Structural counters accumulated during the run.
    pub stats: TreeStatsSnapshot,
}

/// Indicates the severity level of a stress finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational message about the run.
    Info,
    /// Broken invariant or disagreement with the reference set.
    Error,
}

/// A single issue discovered during a verified run.
#[derive(Clone, Debug, Serialize)]
pub struct StressFinding {
    /// The severity level of this finding.
    pub severity: Severity,
    /// Operation after which the issue was observed, if any.
    pub op: Option<Op>,
    /// Human-readable description of the issue.
    pub message: String,
}

impl StressFinding {
    fn error(op: Op, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            op: Some(op),
            message: message.into(),
        }
    }
}

/// Operation counts of a verified run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StressCounts {
    /// Insertions issued.
    pub inserts: u64,
    /// Deletions issued.
    pub deletes: u64,
    /// Full structural validations performed.
    pub checks: u64,
    /// Keys left in the tree afterwards.
    pub final_len: usize,
}

/// Complete report of a verified run.
#[derive(Clone, Debug, Serialize)]
pub struct StressReport {
    /// Engine that was exercised.
    pub tree: TreeKind,
    /// Experiment that was replayed.
    pub experiment: Experiment,
    /// Whether every step agreed with the reference.
    pub success: bool,
    /// Issues discovered during the run.
    pub findings: Vec<StressFinding>,
    /// Operation counts.
    pub counts: StressCounts,
    /// Structural counters accumulated during the run.
    pub stats: TreeStatsSnapshot,
}

/// The keys `-n..n` in an order determined by `rng`.
pub fn permutation<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<i64> {
    let n = i64::try_from(n).unwrap_or(i64::MAX / 2);
    let mut keys: Vec<i64> = (-n..n).collect();
    keys.shuffle(rng);
    keys
}

/// One permutation per size, all drawn from a single seeded generator.
pub fn permutations(sizes: &[usize], seed: u64) -> Vec<Vec<i64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    sizes.iter().map(|&n| permutation(n, &mut rng)).collect()
}

fn check_fraction(delete_fraction: f64) -> Result<()> {
    if (0.0..=1.0).contains(&delete_fraction) {
        Ok(())
    } else {
        Err(TreeError::InvalidDeleteFraction(delete_fraction))
    }
}

/// Applies `experiment` to `tree`, handing every mutation to `observe` right
/// after it was performed. Stops early when `observe` breaks.
fn drive<F>(
    tree: &mut dyn OrderedSet<i64>,
    experiment: Experiment,
    keys: &[i64],
    delete_fraction: f64,
    mut observe: F,
) where
    F: FnMut(Op, &dyn OrderedSet<i64>) -> ControlFlow<()>,
{
    let mut pending: Vec<i64> = match experiment {
        Experiment::Insert => Vec::new(),
        Experiment::InsertDeleteInsert => {
            let count = (keys.len() as f64 * delete_fraction).floor() as usize;
            keys[..count.min(keys.len())].to_vec()
        }
    };

    for &key in keys {
        tree.insert(key);
        if observe(Op::Insert(key), &*tree).is_break() {
            return;
        }
        while let Some(&next) = pending.last() {
            if !tree.has(&next) {
                break;
            }
            pending.pop();
            tree.delete(&next);
            if observe(Op::Delete(next), &*tree).is_break() {
                return;
            }
        }
    }
}

/// Times `experiment` on a fresh engine of `kind`.
pub fn run(
    kind: TreeKind,
    experiment: Experiment,
    keys: &[i64],
    delete_fraction: f64,
) -> Result<RunReport> {
    check_fraction(delete_fraction)?;
    let mut tree = kind.build()?;

    let started = Instant::now();
    drive(tree.as_mut(), experiment, keys, delete_fraction, |_, _| {
        ControlFlow::Continue(())
    });
    let elapsed = started.elapsed();

    let report = RunReport {
        tree: kind,
        experiment,
        elements: keys.len(),
        elapsed_secs: elapsed.as_secs_f64(),
        final_len: tree.len(),
        stats: tree.stats(),
    };
    tracing::info!(
        tree = %kind,
        %experiment,
        elements = report.elements,
        elapsed_ms = elapsed.as_millis() as u64,
        "workload run finished"
    );
    report.stats.emit_tracing(&kind.to_string());
    Ok(report)
}

/// Runs every configured tree over every configured size, calling `on_run`
/// after each measurement.
pub fn bench<F>(options: &WorkloadOptions, mut on_run: F) -> Result<Vec<RunReport>>
where
    F: FnMut(&RunReport),
{
    check_fraction(options.delete_fraction)?;
    let inputs = permutations(&options.sizes, options.seed);

    let mut reports = Vec::with_capacity(options.trees.len() * inputs.len());
    for &kind in &options.trees {
        for keys in &inputs {
            let report = run(kind, options.experiment, keys, options.delete_fraction)?;
            on_run(&report);
            reports.push(report);
        }
    }
    Ok(reports)
}

/// Replays `experiment` on a fresh engine of `kind`, validating the tree and
/// comparing it with a reference set after every operation.
///
/// Checking stops at the first disagreement; later steps would only repeat it.
pub fn verify(
    kind: TreeKind,
    experiment: Experiment,
    keys: &[i64],
    delete_fraction: f64,
) -> Result<StressReport> {
    check_fraction(delete_fraction)?;
    let mut tree = kind.build()?;
    let mut reference = BTreeSet::new();
    let mut findings = Vec::new();
    let mut counts = StressCounts::default();

    drive(tree.as_mut(), experiment, keys, delete_fraction, |op, tree| {
        let (key, expect_present) = match op {
            Op::Insert(key) => {
                counts.inserts += 1;
                reference.insert(key);
                (key, true)
            }
            Op::Delete(key) => {
                counts.deletes += 1;
                reference.remove(&key);
                (key, false)
            }
        };

        counts.checks += 1;
        if let Err(violation) = tree.validate() {
            findings.push(StressFinding::error(op, violation.to_string()));
        }
        if tree.has(&key) != expect_present {
            findings.push(StressFinding::error(
                op,
                format!("has({key}) returned {}", !expect_present),
            ));
        }
        if tree.len() != reference.len() {
            findings.push(StressFinding::error(
                op,
                format!("len {} but reference holds {}", tree.len(), reference.len()),
            ));
        }
        let values = tree.values();
        if !values.iter().eq(reference.iter()) {
            findings.push(StressFinding::error(
                op,
                format!("values diverge from reference ({} keys)", values.len()),
            ));
        }

        if findings.is_empty() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    });
    findings.truncate(MAX_FINDINGS);

    counts.final_len = tree.len();
    let success = findings.iter().all(|f| f.severity != Severity::Error);
    if success {
        tracing::info!(tree = %kind, %experiment, checks = counts.checks, "verified run passed");
    } else {
        tracing::error!(tree = %kind, %experiment, findings = findings.len(), "verified run failed");
    }
    findings.push(StressFinding {
        severity: Severity::Info,
        op: None,
        message: format!(
            "{} inserts, {} deletes, {} checks",
            counts.inserts, counts.deletes, counts.checks
        ),
    });

    Ok(StressReport {
        tree: kind,
        experiment,
        success,
        findings,
        counts,
        stats: tree.stats(),
    })
}
