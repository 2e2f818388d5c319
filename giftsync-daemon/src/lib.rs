//! Sync daemon: bounded-concurrency scheduler and the perpetual sync loop.

mod error;
mod runtime;
pub mod scheduler;

pub use error::DaemonError;
pub use runtime::{
    init_tracing, run_once_blocking, start_blocking, CollectionReport, CyclePhase, SyncLoop,
};
pub use scheduler::Scheduler;
