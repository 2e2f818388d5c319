use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::Instant;

use giftsync_core::{CollectionSpec, Config, GiftRecord};
use giftsync_renderer::IndexContext;
use giftsync_source::{GiftSource, HttpSource};
use giftsync_sync::{reconcile, state_store, PublishReport, Publisher, SyncState};

use crate::error::{io_err, DaemonError};
use crate::scheduler::Scheduler;

/// Where the loop currently is. Shutdown is only honoured between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Fetching,
    Reconciling,
    Publishing,
    Sleeping,
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub collection: String,
    pub changed: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Whether the state snapshot was written after this pass.
    pub persisted: bool,
    pub published: usize,
    pub publish_failures: usize,
}

/// Owns [`SyncState`] and drives fetch, reconcile, persist and publish for
/// every configured collection, forever.
pub struct SyncLoop {
    collections: Vec<CollectionSpec>,
    poll_interval: Duration,
    scheduler: Scheduler,
    publisher: Arc<Publisher>,
    state: SyncState,
    state_path: PathBuf,
    phase: CyclePhase,
}

impl SyncLoop {
    pub fn new(
        config: &Config,
        source: Arc<dyn GiftSource>,
        publisher: Publisher,
        state: SyncState,
    ) -> Self {
        let layout = publisher.layout().clone();
        Self {
            collections: config.collections.clone(),
            poll_interval: config.poll_interval(),
            scheduler: Scheduler::new(source, layout, config.concurrency),
            publisher: Arc::new(publisher),
            state,
            state_path: config.output.state_file.clone(),
            phase: CyclePhase::Idle,
        }
    }

    /// Production wiring: HTTP source, local publisher, state loaded from disk.
    pub fn from_config(config: &Config) -> Result<Self, DaemonError> {
        let source: Arc<dyn GiftSource> = Arc::new(HttpSource::from_config(&config.sources));
        let publisher = Publisher::from_config(&config.output)?;
        let state = state_store::load_at(&config.output.state_file);
        tracing::info!(
            path = %config.output.state_file.display(),
            entities = state.len(),
            "loaded sync state"
        );
        Ok(Self::new(config, source, publisher, state))
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Run one full pass over `spec`: fetch, reconcile, persist, publish.
    ///
    /// Never fails; entity, persistence and publish errors are logged and
    /// counted in the report.
    pub async fn run_collection(&mut self, spec: &CollectionSpec) -> CollectionReport {
        let started = Instant::now();
        tracing::info!(collection = %spec.name, ids = spec.len(), "collection pass started");

        self.phase = CyclePhase::Fetching;
        let outcomes = self.scheduler.run(spec).await;

        self.phase = CyclePhase::Reconciling;
        let reconciled = reconcile(&mut self.state, &spec.name, outcomes);
        let changed = reconciled.changed.len();
        let persisted = self.persist().await;

        self.phase = CyclePhase::Publishing;
        let publish = if changed == 0 {
            PublishReport::default()
        } else {
            let index = IndexContext::from_records(&spec.name, self.state.records(&spec.name));
            self.publish(reconciled.changed, index).await
        };

        let report = CollectionReport {
            collection: spec.name.clone(),
            changed,
            unchanged: reconciled.unchanged,
            failed: reconciled.failed.len(),
            persisted,
            published: publish.written.len(),
            publish_failures: publish.failures.len(),
        };
        tracing::info!(
            collection = %report.collection,
            changed = report.changed,
            unchanged = report.unchanged,
            failed = report.failed,
            published = report.published,
            duration_ms = started.elapsed().as_millis() as u64,
            "collection pass finished"
        );
        report
    }

    /// One pass over every configured collection.
    pub async fn run_cycle(&mut self) -> Vec<CollectionReport> {
        self.cycle(None).await
    }

    /// Cycle until `shutdown` fires. A collection pass in progress always
    /// completes before the signal is observed.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), DaemonError> {
        loop {
            if shutdown_requested(&mut shutdown) {
                break;
            }
            self.cycle(Some(&mut shutdown)).await;
            if shutdown_requested(&mut shutdown) {
                break;
            }

            self.phase = CyclePhase::Sleeping;
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        self.phase = CyclePhase::Idle;
        tracing::info!("sync loop stopped");
        Ok(())
    }

    async fn cycle(
        &mut self,
        mut shutdown: Option<&mut broadcast::Receiver<()>>,
    ) -> Vec<CollectionReport> {
        let started = Instant::now();
        tracing::info!(collections = self.collections.len(), "cycle started");

        let collections = self.collections.clone();
        let mut reports = Vec::with_capacity(collections.len());
        for spec in &collections {
            if let Some(rx) = shutdown.as_deref_mut() {
                if shutdown_requested(rx) {
                    tracing::info!(collection = %spec.name, "shutdown requested; skipping remaining collections");
                    break;
                }
            }
            reports.push(self.run_collection(spec).await);
        }

        self.phase = CyclePhase::Idle;
        tracing::info!(
            changed = reports.iter().map(|r| r.changed).sum::<usize>(),
            failed = reports.iter().map(|r| r.failed).sum::<usize>(),
            duration_ms = started.elapsed().as_millis() as u64,
            "cycle finished"
        );
        reports
    }

    /// Write the full snapshot. On failure the in-memory state is kept and
    /// the next pass tries again.
    async fn persist(&self) -> bool {
        let bytes = match state_store::encode(&self.state) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(error = %err, "cannot encode sync state");
                return false;
            }
        };
        let path = self.state_path.clone();
        let written =
            tokio::task::spawn_blocking(move || state_store::write_atomic(&path, &bytes)).await;
        match written {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                tracing::error!(path = %self.state_path.display(), error = %err, "persisting sync state failed");
                false
            }
            Err(err) => {
                tracing::error!(error = %err, "persist task died");
                false
            }
        }
    }

    async fn publish(&self, changed: Vec<GiftRecord>, index: IndexContext) -> PublishReport {
        let publisher = Arc::clone(&self.publisher);
        let collection = index.collection.clone();
        let attempted = changed.len() + 1;
        match tokio::task::spawn_blocking(move || publisher.publish_collection(&changed, &index)).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(collection = %collection, error = %err, "publish task died");
                PublishReport {
                    written: Vec::new(),
                    failures: vec![(collection, err.to_string()); attempted],
                }
            }
        }
    }
}

fn shutdown_requested(rx: &mut broadcast::Receiver<()>) -> bool {
    !matches!(rx.try_recv(), Err(TryRecvError::Empty))
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Start the sync loop and block the current thread until Ctrl-C.
pub fn start_blocking(config: Config) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = build_runtime()?;
    runtime.block_on(async move {
        let sync_loop = SyncLoop::from_config(&config)?;
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);

        let signal_handle = tokio::spawn(forward_signal(
            tokio::signal::ctrl_c(),
            shutdown_tx.clone(),
        ));

        let result = sync_loop.run(shutdown_rx).await;
        signal_handle.abort();
        result
    })
}

/// Turn the first delivery of `signal` into a shutdown broadcast. A signal
/// source that cannot be installed is logged and never stops the loop.
async fn forward_signal<F>(signal: F, shutdown: broadcast::Sender<()>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("received ctrl-c, finishing current collection");
            let _ = shutdown.send(());
        }
        Err(err) => {
            tracing::error!(error = %err, "ctrl-c handler unavailable; sync loop keeps running");
        }
    }
}

/// Run exactly one cycle and return its reports.
pub fn run_once_blocking(config: Config) -> Result<Vec<CollectionReport>, DaemonError> {
    init_tracing();
    let runtime = build_runtime()?;
    runtime.block_on(async move {
        let mut sync_loop = SyncLoop::from_config(&config)?;
        Ok::<_, DaemonError>(sync_loop.run_cycle().await)
    })
}

fn build_runtime() -> Result<tokio::runtime::Runtime, DaemonError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))
}

/// Install the fmt subscriber (`RUST_LOG`, default `info`). Safe to call
/// more than once.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
