//! YAML configuration.
//!
//! # Layout
//!
//! ```yaml
//! collections:
//!   - { name: PlushPepe, start_id: 1, end_id: 2000 }
//! poll_interval_secs: 60
//! concurrency: 100
//! sources:
//!   primary_base: https://nft.fragment.com
//!   secondary_base: https://t.me
//! output:
//!   state_file: state/gift_state.json
//!   publish_root: public
//! ```
//!
//! Everything except `collections` has a default. After parsing, selected
//! fields may be overridden from `GIFTSYNC_*` environment variables, then the
//! result is validated. Any failure is fatal and reported before the sync loop
//! starts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::CollectionSpec;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "giftsync.yaml";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub collections: Vec<CollectionSpec>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Upstream endpoints and HTTP behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_primary_base")]
    pub primary_base: String,
    #[serde(default = "default_secondary_base")]
    pub secondary_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Where state and published artifacts live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_publish_root")]
    pub publish_root: PathBuf,
    #[serde(default = "default_gifts_folder")]
    pub gifts_folder: String,
    #[serde(default = "default_json_folder")]
    pub json_folder: String,
    /// Optional directory of `.html` templates overriding the embedded ones.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            primary_base: default_primary_base(),
            secondary_base: default_secondary_base(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            publish_root: default_publish_root(),
            gifts_folder: default_gifts_folder(),
            json_folder: default_json_folder(),
            templates_dir: None,
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_concurrency() -> usize {
    100
}

fn default_primary_base() -> String {
    "https://nft.fragment.com".to_string()
}

fn default_secondary_base() -> String {
    "https://t.me".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from("state").join("gift_state.json")
}

fn default_publish_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_gifts_folder() -> String {
    "gifts".to_string()
}

fn default_json_folder() -> String {
    "json_data".to_string()
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.sources.timeout_secs)
    }

    /// Look up a configured collection by name.
    pub fn collection(&self, name: &str) -> Option<&CollectionSpec> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Check structural rules. Called by [`load_at`]; exposed for configs
    /// built in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collections.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one collection must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            let name = collection.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid(
                    "collection name must not be empty".to_string(),
                ));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(ConfigError::Invalid(format!(
                    "collection name '{name}' must not contain path separators"
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(ConfigError::Invalid(format!(
                    "collection '{name}' is configured more than once"
                )));
            }
            if collection.start_id > collection.end_id {
                return Err(ConfigError::Invalid(format!(
                    "collection '{name}': start_id {} is greater than end_id {}",
                    collection.start_id, collection.end_id
                )));
            }
        }

        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.sources.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "sources.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `GIFTSYNC_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GIFTSYNC_PUBLISH_ROOT") {
            self.output.publish_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("GIFTSYNC_STATE_FILE") {
            self.output.state_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("GIFTSYNC_GIFTS_FOLDER") {
            self.output.gifts_folder = v;
        }
        if let Some(v) = lookup("GIFTSYNC_JSON_FOLDER") {
            self.output.json_folder = v;
        }
        if let Some(v) = lookup("GIFTSYNC_CONCURRENCY") {
            self.concurrency = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "GIFTSYNC_CONCURRENCY",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("GIFTSYNC_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "GIFTSYNC_POLL_INTERVAL_SECS",
                value: v.clone(),
            })?;
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_with(|name| std::env::var(name).ok())
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Parse a config from YAML text without touching the environment.
pub fn parse(path: &Path, contents: &str) -> Result<Config, ConfigError> {
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load, override from the environment, and validate the config at `path`.
///
/// Returns `ConfigError::ConfigNotFound` if absent and `ConfigError::Parse`
/// (with path + line context) if the YAML is malformed.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse(path, &contents)?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}
