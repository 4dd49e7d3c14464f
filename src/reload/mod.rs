//! Reload job sequencing
//!
//! Serializes remote "reload configuration" requests: one call in flight at
//! a time, FIFO queue for requests that arrive while one is outstanding,
//! page-unload guard held for the whole busy period.

mod coordinator;
mod job;

pub use coordinator::{
    NullUnloadGuard, ReloadCoordinator, ReloadObserver, ReloadResponse, ReloadStats,
    ReloadTransport, TracingObserver, UnloadGuard,
};
pub use job::{JobOutcome, JobState, ReloadEvent, ReloadJob};
