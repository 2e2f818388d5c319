//! State store: the persisted snapshot of every known gift.
//!
//! Persists a [`SyncState`] JSON document at a configured path:
//!
//! ```json
//! {"version":1,"collections":{"PlushPepe":{"PlushPepe_1":{"record":{..},"content_hash":".."}}}}
//! ```
//!
//! Maps are ordered, so encoding the same state always yields the same
//! bytes. Writes go to `<path>.tmp` and are renamed into place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use giftsync_core::{EntityKey, GiftRecord};

use crate::error::{io_err, SyncError};

pub const STATE_VERSION: u32 = 1;

/// A stored record together with the hash of its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGift {
    pub record: GiftRecord,
    pub content_hash: String,
}

/// Every stored gift of one collection, keyed by entity key.
pub type CollectionState = BTreeMap<EntityKey, StoredGift>;

/// On-disk state payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionState>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            collections: BTreeMap::new(),
        }
    }
}

impl SyncState {
    pub fn collection(&self, name: &str) -> Option<&CollectionState> {
        self.collections.get(name)
    }

    pub fn stored_hash(&self, collection: &str, key: &EntityKey) -> Option<&str> {
        self.collections
            .get(collection)
            .and_then(|entries| entries.get(key))
            .map(|stored| stored.content_hash.as_str())
    }

    /// Records of `collection`, in key order.
    pub fn records<'a>(&'a self, collection: &str) -> impl Iterator<Item = &'a GiftRecord> + 'a {
        self.collections
            .get(collection)
            .into_iter()
            .flat_map(|entries| entries.values().map(|stored| &stored.record))
    }

    /// Total number of stored gifts across all collections.
    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `record` with its hash. Only reconcile writes entries.
    pub(crate) fn upsert(&mut self, record: GiftRecord, content_hash: String) {
        self.collections
            .entry(record.collection.clone())
            .or_default()
            .insert(record.key(), StoredGift { record, content_hash });
    }
}

/// Load the state at `path`.
///
/// A missing file yields an empty state. An unreadable or corrupt file is
/// logged and also yields an empty state, so the next cycle rebuilds it.
pub fn load_at(path: &Path) -> SyncState {
    if !path.exists() {
        return SyncState::default();
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("cannot read state {}: {e}; starting empty", path.display());
            return SyncState::default();
        }
    };
    match serde_json::from_str::<SyncState>(&contents) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("corrupt state {}: {e}; starting empty", path.display());
            SyncState::default()
        }
    }
}

/// Serialize `state` to its on-disk bytes.
pub fn encode(state: &SyncState) -> Result<Vec<u8>, SyncError> {
    let mut json = serde_json::to_vec_pretty(state)?;
    json.push(b'\n');
    Ok(json)
}

/// Write `bytes` to `path` via `<path>.tmp` and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Save `state` to `path` atomically.
pub fn save_at(path: &Path, state: &SyncState) -> Result<(), SyncError> {
    write_atomic(path, &encode(state)?)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
