//! Content hashing and change classification.
//!
//! The hash covers every record field except `artifact_path`, serialized
//! as JSON with object keys sorted at every depth, then SHA-256 hex
//! encoded. Two records with equal content always hash equal, whatever
//! order their fields were built in.

use serde_json::Value;
use sha2::{Digest, Sha256};

use giftsync_core::GiftRecord;

use crate::error::SyncError;

/// Result of comparing a fresh record with the stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Changed,
    Unchanged,
}

/// SHA-256 hex digest of the record's content.
pub fn content_hash(record: &GiftRecord) -> Result<String, SyncError> {
    let mut value = serde_json::to_value(record)?;
    if let Some(map) = value.as_object_mut() {
        map.remove("artifact_path");
    }
    let canonical = serde_json::to_string(&sorted(value))?;

    let mut h = Sha256::new();
    h.update(canonical.as_bytes());
    Ok(hex::encode(h.finalize()))
}

/// `Changed` when there is no stored hash or it differs from `new`.
pub fn classify(stored: Option<&str>, new: &str) -> ChangeKind {
    match stored {
        Some(old) if old == new => ChangeKind::Unchanged,
        _ => ChangeKind::Changed,
    }
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
