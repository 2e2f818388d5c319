//! Per-entity assembly and the reconcile step.
//!
//! [`assemble_gift`] runs inside a scheduler worker and never fails: a
//! fetch error becomes [`GiftOutcome::Failed`]. [`reconcile`] is the only
//! code that writes entries into [`SyncState`].

use std::collections::BTreeMap;

use giftsync_core::{EntityKey, GiftRecord};
use giftsync_source::{ErrorKind, GiftSource};

use crate::change::{classify, content_hash, ChangeKind};
use crate::merge::merge;
use crate::publish::ArtifactLayout;
use crate::state_store::SyncState;

/// A gift that could not be assembled this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedGift {
    pub key: EntityKey,
    pub kind: ErrorKind,
}

/// Result of one fetch task.
#[derive(Debug, Clone, PartialEq)]
pub enum GiftOutcome {
    Fetched(GiftRecord),
    Failed(FailedGift),
}

impl GiftOutcome {
    pub fn failed(key: EntityKey, kind: ErrorKind) -> Self {
        Self::Failed(FailedGift { key, kind })
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Self::Fetched(record) => record.key(),
            Self::Failed(failed) => failed.key.clone(),
        }
    }
}

/// Fetch both sources for one gift and merge them.
///
/// The secondary source is only consulted once the primary succeeded.
pub fn assemble_gift(
    source: &dyn GiftSource,
    collection: &str,
    id: u64,
    layout: &ArtifactLayout,
) -> GiftOutcome {
    let key = EntityKey::new(collection, id);
    let primary = match source.fetch_primary(collection, id) {
        Ok(primary) => primary,
        Err(e) => {
            tracing::warn!("fetch failed for {key}: {e}");
            return GiftOutcome::failed(key, e.kind());
        }
    };
    let secondary = source.fetch_secondary(collection, id);

    let mut record = merge(collection, id, primary, secondary);
    record.artifact_path = layout.gift_page(&key);
    GiftOutcome::Fetched(record)
}

/// Classification of one collection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Changed records, in key order. These are what gets published.
    pub changed: Vec<GiftRecord>,
    pub unchanged: usize,
    pub failed: Vec<FailedGift>,
}

/// Fold `outcomes` for `collection` into `state`.
///
/// Every fetched record replaces its stored entry, so stored hashes always
/// match stored content. Failed entities keep whatever was stored before,
/// and entities absent from `outcomes` are left alone.
pub fn reconcile(
    state: &mut SyncState,
    collection: &str,
    outcomes: BTreeMap<EntityKey, GiftOutcome>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for (key, outcome) in outcomes {
        let record = match outcome {
            GiftOutcome::Fetched(record) => record,
            GiftOutcome::Failed(failed) => {
                report.failed.push(failed);
                continue;
            }
        };

        let hash = match content_hash(&record) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!("cannot hash {key}: {e}");
                report.failed.push(FailedGift {
                    key,
                    kind: ErrorKind::Decode,
                });
                continue;
            }
        };

        match classify(state.stored_hash(collection, &key), &hash) {
            ChangeKind::Changed => report.changed.push(record.clone()),
            ChangeKind::Unchanged => report.unchanged += 1,
        }
        state.upsert(record, hash);
    }

    report
}
