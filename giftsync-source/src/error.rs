//! Error types for giftsync-source.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why fetching one gift failed. Always scoped to a single entity.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, timeout, or non-2xx status.
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The response body was not the expected JSON document.
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response body could not be read as text (invalid UTF-8, too large).
    #[error("unreadable body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The worker running the fetch stopped before reporting a result.
    #[error("fetch task aborted: {reason}")]
    Aborted { reason: String },
}

/// Coarse classification stored on error-state records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Decode,
    Aborted,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::Decode { .. } | FetchError::Body { .. } => ErrorKind::Decode,
            FetchError::Aborted { .. } => ErrorKind::Aborted,
        }
    }
}
