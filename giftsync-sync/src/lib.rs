//! # giftsync-sync
//!
//! Reconciliation primitives driven by the daemon's sync loop:
//!
//! - [`merge`]: combine primary and secondary source data into a record
//! - [`change`]: content hashing and changed/unchanged classification
//! - [`state_store`]: the persisted [`SyncState`] snapshot
//! - [`pipeline`]: per-entity assembly and the single reconcile step
//! - [`publish`]: rendering and atomic writing of artifacts

pub mod change;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod publish;
pub mod state_store;

pub use change::{classify, content_hash, ChangeKind};
pub use error::SyncError;
pub use merge::merge;
pub use pipeline::{assemble_gift, reconcile, FailedGift, GiftOutcome, ReconcileReport};
pub use publish::{ArtifactLayout, ArtifactSink, LocalDirSink, PublishReport, Publisher};
pub use state_store::{StoredGift, SyncState};
