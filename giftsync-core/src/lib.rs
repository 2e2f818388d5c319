//! giftsync core library: domain types, configuration and errors.
//!
//! - [`types`]: gift records, attributes, entity keys, collection ranges
//! - [`config`]: YAML configuration with environment overrides
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, OutputConfig, SourceConfig};
pub use error::ConfigError;
pub use types::{
    Attribute, CollectionSpec, EntityKey, GiftRecord, DEFAULT_OWNER, DEFAULT_OWNER_AVATAR,
};
