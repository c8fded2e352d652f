//! Error types surfaced at the library boundary.
//!
//! Routing itself never fails: adapter errors are `anyhow` values caught by
//! the orchestrator. Only configuration loading reports typed errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("threshold `{name}` must be within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("threshold ordering violated: {0}")]
    Ordering(String),

    #[error("invalid tool catalog: {0}")]
    Catalog(String),
}
