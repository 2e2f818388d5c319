//! Domain types for gift records.
//!
//! A gift is identified by `(collection, id)`; its string form
//! `{collection}_{id}` is the [`EntityKey`] used in persisted state and in
//! artifact file names.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Owner name used when neither source supplies one.
pub const DEFAULT_OWNER: &str = "User";

/// Owner avatar used when the secondary source supplies none.
pub const DEFAULT_OWNER_AVATAR: &str = "https://default-avatar.url/placeholder.png";

// ---------------------------------------------------------------------------
// EntityKey
// ---------------------------------------------------------------------------

/// Stable `{collection}_{id}` key for one gift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(pub String);

impl EntityKey {
    pub fn new(collection: &str, id: u64) -> Self {
        Self(format!("{collection}_{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EntityKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// A trait-type/value pair with its rarity percent.
///
/// `(trait_type, value)` is unique within one record's attribute sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
    #[serde(default)]
    pub percent: f64,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>, percent: f64) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
            percent,
        }
    }

    /// Exact match on the uniqueness key.
    pub fn matches(&self, other: &Attribute) -> bool {
        self.trait_type == other.trait_type && self.value == other.value
    }
}

// ---------------------------------------------------------------------------
// GiftRecord
// ---------------------------------------------------------------------------

/// Canonical record for one gift, assembled from both sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftRecord {
    pub collection: String,
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub lottie: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_telegram_id: String,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_telegram_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub owner_avatar: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Output location of the rendered page. Derived; not content.
    #[serde(default)]
    pub artifact_path: String,
}

impl GiftRecord {
    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.collection, self.id)
    }

    /// Mean attribute percent, `0.0` when there are no attributes.
    pub fn average_rarity(&self) -> f64 {
        if self.attributes.is_empty() {
            return 0.0;
        }
        let total: f64 = self.attributes.iter().map(|a| a.percent).sum();
        total / self.attributes.len() as f64
    }
}

// ---------------------------------------------------------------------------
// CollectionSpec
// ---------------------------------------------------------------------------

/// One contiguous, inclusive id range to sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    pub start_id: u64,
    pub end_id: u64,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, start_id: u64, end_id: u64) -> Self {
        Self {
            name: name.into(),
            start_id,
            end_id,
        }
    }

    pub fn ids(&self) -> RangeInclusive<u64> {
        self.start_id..=self.end_id
    }

    /// Number of ids in the range (`0` for an inverted range).
    pub fn len(&self) -> u64 {
        if self.end_id < self.start_id {
            0
        } else {
            self.end_id - self.start_id + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key(&self, id: u64) -> EntityKey {
        EntityKey::new(&self.name, id)
    }
}
