use std::path::PathBuf;

use thiserror::Error;

/// Error surface for daemon startup and runtime.
///
/// Nothing inside a running cycle produces one of these; they only abort
/// startup or report a broken runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] giftsync_core::ConfigError),

    #[error("sync error: {0}")]
    Sync(#[from] giftsync_sync::SyncError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
