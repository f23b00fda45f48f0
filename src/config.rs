//! Optional TOML configuration for the `ordtrees` binary.
//!
//! ```toml
//! log_level = "info"
//!
//! [bench]
//! sizes = [100, 1000]
//! seed = 7
//! delete_fraction = 0.5
//! trees = ["splay", "red-black", "btree:4"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::set::TreeKind;
use crate::workload::{Experiment, WorkloadOptions};

/// Contents of the configuration file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Log filter used when neither `--log-level` nor `RUST_LOG` is given.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Benchmark defaults.
    #[serde(default)]
    pub bench: BenchSection,
    #[serde(skip)]
    path: Option<PathBuf>,
}

/// The `[bench]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BenchSection {
    /// Permutation sizes.
    pub sizes: Option<Vec<usize>>,
    /// Permutation seed.
    pub seed: Option<u64>,
    /// Share of each permutation deleted again.
    pub delete_fraction: Option<f64>,
    /// Engines to run.
    pub trees: Option<Vec<TreeKind>>,
    /// Experiment to run.
    pub experiment: Option<Experiment>,
}

impl Config {
    /// Loads `explicit`, or the per-user default file when no path is given.
    /// A missing file yields the empty configuration.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        let path = explicit.or_else(default_config_path);
        let mut config = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => Config::default(),
        };
        config.path = path;
        Ok(config)
    }

    /// Path the configuration was looked up at.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Overlays the file's bench values on `options`.
    pub fn apply(&self, options: &mut WorkloadOptions) {
        let bench = &self.bench;
        if let Some(sizes) = &bench.sizes {
            options.sizes = sizes.clone();
        }
        if let Some(seed) = bench.seed {
            options.seed = seed;
        }
        if let Some(fraction) = bench.delete_fraction {
            options.delete_fraction = fraction;
        }
        if let Some(trees) = &bench.trees {
            options.trees = trees.clone();
        }
        if let Some(experiment) = bench.experiment {
            options.experiment = experiment;
        }
    }
}

fn read_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).map_err(|source| TreeError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| TreeError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

/// `<config_dir>/ordtrees/config.toml`, when the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("ordtrees").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(Some(path.clone())).unwrap();
        assert_eq!(config.path(), Some(path.as_path()));
        assert_eq!(config.bench, BenchSection::default());

        let mut options = WorkloadOptions::default();
        config.apply(&mut options);
        assert_eq!(options, WorkloadOptions::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
log_level = "debug"

[bench]
sizes = [10, 20]
seed = 7
delete_fraction = 0.25
trees = ["splay", "2-3-4", "btree:6"]
experiment = "insert-delete-insert"
"#,
        );
        let config = Config::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        let mut options = WorkloadOptions::default();
        config.apply(&mut options);
        assert_eq!(options.sizes, vec![10, 20]);
        assert_eq!(options.seed, 7);
        assert_eq!(options.delete_fraction, 0.25);
        assert_eq!(
            options.trees,
            vec![
                TreeKind::Splay,
                TreeKind::BTree { order: 2 },
                TreeKind::BTree { order: 6 },
            ]
        );
        assert_eq!(options.experiment, Experiment::InsertDeleteInsert);
    }

    #[test]
    fn unknown_tree_is_a_parse_error() {
        let file = write_config("[bench]\ntrees = [\"avl\"]\n");
        let err = Config::load(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, TreeError::ConfigParse { .. }), "{err}");
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let file = write_config("[bench]\nthreads = 4\n");
        assert!(matches!(
            Config::load(Some(file.path().to_path_buf())),
            Err(TreeError::ConfigParse { .. })
        ));
    }
}
