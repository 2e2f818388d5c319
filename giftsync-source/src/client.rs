//! HTTP access to both upstream sources.
//!
//! [`GiftSource`] is the seam the scheduler fans out over; [`HttpSource`] is
//! the production implementation. Calls are blocking and carry no retries:
//! a failed entity is simply attempted again on the next cycle.

use std::io;
use std::time::Duration;

use giftsync_core::SourceConfig;

use crate::error::FetchError;
use crate::primary::{parse_primary, PrimaryData};
use crate::secondary::{parse_gift_table, SecondaryData};

/// Retrieval of raw data for one gift.
///
/// Implementations are shared across worker threads and must not hold
/// per-call mutable state.
pub trait GiftSource: Send + Sync {
    /// Fetch the primary JSON document. Any failure is an entity error.
    fn fetch_primary(&self, collection: &str, id: u64) -> Result<PrimaryData, FetchError>;

    /// Fetch the secondary HTML page. Failures yield an empty result.
    fn fetch_secondary(&self, collection: &str, id: u64) -> SecondaryData;
}

/// Base URLs of the two sources, without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoints {
    pub primary_base: String,
    pub secondary_base: String,
}

impl SourceEndpoints {
    /// `{primary_base}/gift/{collection-lowercased}-{id}`
    pub fn primary_url(&self, collection: &str, id: u64) -> String {
        format!(
            "{}/gift/{}-{id}",
            self.primary_base.trim_end_matches('/'),
            collection.to_lowercase()
        )
    }

    /// `{secondary_base}/nft/{collection}-{id}`
    pub fn secondary_url(&self, collection: &str, id: u64) -> String {
        format!(
            "{}/nft/{collection}-{id}",
            self.secondary_base.trim_end_matches('/')
        )
    }
}

/// ureq-backed [`GiftSource`].
pub struct HttpSource {
    agent: ureq::Agent,
    endpoints: SourceEndpoints,
}

impl HttpSource {
    pub fn new(endpoints: SourceEndpoints, timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent, endpoints }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(
            SourceEndpoints {
                primary_base: config.primary_base.clone(),
                secondary_base: config.secondary_base.clone(),
            },
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => FetchError::Network {
                url: url.to_string(),
                reason: format!("HTTP status {code}"),
            },
            ureq::Error::Transport(transport) => FetchError::Network {
                url: url.to_string(),
                reason: transport.to_string(),
            },
        })?;
        response.into_string().map_err(|err| match err.kind() {
            io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => FetchError::Network {
                url: url.to_string(),
                reason: format!("reading body: {err}"),
            },
            _ => FetchError::Body {
                url: url.to_string(),
                source: err,
            },
        })
    }
}

impl GiftSource for HttpSource {
    fn fetch_primary(&self, collection: &str, id: u64) -> Result<PrimaryData, FetchError> {
        let url = self.endpoints.primary_url(collection, id);
        let body = self.get_text(&url)?;
        parse_primary(&body).map_err(|source| FetchError::Decode { url, source })
    }

    fn fetch_secondary(&self, collection: &str, id: u64) -> SecondaryData {
        let url = self.endpoints.secondary_url(collection, id);
        match self.get_text(&url) {
            Ok(body) => parse_gift_table(&body),
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "secondary fetch failed; using primary data only");
                SecondaryData::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> SourceEndpoints {
        SourceEndpoints {
            primary_base: "https://nft.fragment.com/".to_string(),
            secondary_base: "https://t.me".to_string(),
        }
    }

    #[test]
    fn primary_url_lowercases_collection() {
        assert_eq!(
            endpoints().primary_url("PlushPepe", 12),
            "https://nft.fragment.com/gift/plushpepe-12"
        );
    }

    #[test]
    fn secondary_url_keeps_collection_case() {
        assert_eq!(
            endpoints().secondary_url("PlushPepe", 12),
            "https://t.me/nft/PlushPepe-12"
        );
    }
}
