//! Tracing subscriber setup for the binary.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, TreeError};

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` when set, and by
/// `level` otherwise.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| TreeError::Logging(format!("invalid log level `{level}`: {e}")))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| TreeError::Logging("logging already initialized".into()))
}
