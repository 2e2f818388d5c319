//! Bounded-concurrency fetch stage.
//!
//! One blocking task per id assembles a gift; a [`Semaphore`] caps how many
//! run at once. Finished outcomes travel over a bounded channel to the
//! coordinating call, which is the only place they are collected. Workers
//! never see [`SyncState`](giftsync_sync::SyncState).

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use giftsync_core::{CollectionSpec, EntityKey};
use giftsync_source::{ErrorKind, GiftSource};
use giftsync_sync::{assemble_gift, ArtifactLayout, GiftOutcome};

pub struct Scheduler {
    source: Arc<dyn GiftSource>,
    layout: Arc<ArtifactLayout>,
    limit: usize,
}

impl Scheduler {
    /// `limit` is clamped to at least one worker.
    pub fn new(source: Arc<dyn GiftSource>, layout: ArtifactLayout, limit: usize) -> Self {
        Self {
            source,
            layout: Arc::new(layout),
            limit: limit.max(1),
        }
    }

    /// Fetch and merge every id of `spec`.
    ///
    /// Returns one outcome per id. Completion order is not observable: the
    /// map is keyed by entity key. A worker that dies without reporting is
    /// recorded as [`ErrorKind::Aborted`].
    pub async fn run(&self, spec: &CollectionSpec) -> BTreeMap<EntityKey, GiftOutcome> {
        let (tx, mut rx) = mpsc::channel::<GiftOutcome>(self.limit);
        let producer = {
            let semaphore = Arc::new(Semaphore::new(self.limit));
            let source = Arc::clone(&self.source);
            let layout = Arc::clone(&self.layout);
            let collection = spec.name.clone();
            let ids = spec.ids();
            tokio::spawn(async move {
                let mut workers = JoinSet::new();
                for id in ids {
                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                        break;
                    };
                    let tx = tx.clone();
                    let source = Arc::clone(&source);
                    let layout = Arc::clone(&layout);
                    let collection = collection.clone();
                    workers.spawn_blocking(move || {
                        let outcome = assemble_gift(source.as_ref(), &collection, id, &layout);
                        drop(permit);
                        let _ = tx.blocking_send(outcome);
                    });
                }
                drop(tx);
                while let Some(joined) = workers.join_next().await {
                    if let Err(err) = joined {
                        tracing::error!(collection = %collection, error = %err, "fetch worker died");
                    }
                }
            })
        };

        let mut results = BTreeMap::new();
        while let Some(outcome) = rx.recv().await {
            results.insert(outcome.key(), outcome);
        }
        if let Err(err) = producer.await {
            tracing::error!(collection = %spec.name, error = %err, "fetch producer died");
        }

        for id in spec.ids() {
            let key = spec.key(id);
            if !results.contains_key(&key) {
                tracing::warn!(key = %key, "no result reported; marking aborted");
                results.insert(key.clone(), GiftOutcome::failed(key, ErrorKind::Aborted));
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use giftsync_source::{FetchError, PrimaryData, SecondaryData};

    #[derive(Default)]
    struct CountingSource {
        failing: HashSet<u64>,
        panicking: HashSet<u64>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GiftSource for CountingSource {
        fn fetch_primary(&self, _collection: &str, id: u64) -> Result<PrimaryData, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(15));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.panicking.contains(&id) {
                panic!("worker blew up on {id}");
            }
            if self.failing.contains(&id) {
                return Err(FetchError::Network {
                    url: format!("fake://{id}"),
                    reason: "connection refused".into(),
                });
            }
            Ok(PrimaryData {
                name: format!("Gift #{id}"),
                ..PrimaryData::default()
            })
        }

        fn fetch_secondary(&self, _collection: &str, _id: u64) -> SecondaryData {
            SecondaryData::default()
        }
    }

    fn scheduler(source: CountingSource, limit: usize) -> (Scheduler, Arc<CountingSource>) {
        let source = Arc::new(source);
        let dyn_source: Arc<dyn GiftSource> = source.clone();
        (Scheduler::new(dyn_source, ArtifactLayout::default(), limit), source)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn never_exceeds_concurrency_limit() {
        let (scheduler, source) = scheduler(CountingSource::default(), 3);
        let results = scheduler.run(&CollectionSpec::new("PlushPepe", 1, 12)).await;

        assert_eq!(results.len(), 12);
        let peak = source.peak.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak concurrency was {peak}");
    }

    #[tokio::test]
    async fn records_keep_their_own_ids() {
        let (scheduler, _) = scheduler(CountingSource::default(), 4);
        let results = scheduler.run(&CollectionSpec::new("PlushPepe", 5, 9)).await;

        for (key, outcome) in &results {
            let GiftOutcome::Fetched(record) = outcome else {
                panic!("{key} failed");
            };
            assert_eq!(&record.key(), key);
            assert_eq!(record.name, format!("Gift #{}", record.id));
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_siblings() {
        let source = CountingSource {
            failing: HashSet::from([3]),
            ..CountingSource::default()
        };
        let (scheduler, _) = scheduler(source, 2);
        let results = scheduler.run(&CollectionSpec::new("PlushPepe", 1, 5)).await;

        let failed: Vec<_> = results
            .values()
            .filter_map(|o| match o {
                GiftOutcome::Failed(f) => Some((f.key.as_str().to_string(), f.kind)),
                GiftOutcome::Fetched(_) => None,
            })
            .collect();
        assert_eq!(failed, [("PlushPepe_3".to_string(), ErrorKind::Network)]);
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn panicking_worker_is_recorded_as_aborted() {
        let source = CountingSource {
            panicking: HashSet::from([2]),
            ..CountingSource::default()
        };
        let (scheduler, _) = scheduler(source, 2);
        let results = scheduler.run(&CollectionSpec::new("PlushPepe", 1, 3)).await;

        let key = EntityKey::new("PlushPepe", 2);
        assert_eq!(
            results.get(&key),
            Some(&GiftOutcome::failed(key.clone(), ErrorKind::Aborted))
        );
        assert!(matches!(
            results.get(&EntityKey::new("PlushPepe", 1)),
            Some(GiftOutcome::Fetched(_))
        ));
    }
}
