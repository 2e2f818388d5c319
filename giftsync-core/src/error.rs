//! Error types for giftsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating configuration.
///
/// Every variant is fatal: the process must not enter the sync loop with a
/// configuration that produced one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the offending file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// An environment override could not be parsed.
    #[error("invalid value for ${var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    /// The config parsed but violates a structural rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}
