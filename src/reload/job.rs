//! Reload job records and coordinator events
//!
//! A job is one logical unit of reload work, numbered by arrival order.
//! The coordinator owns each job exclusively from enqueue until it is
//! removed after settlement, and reports settlements as typed events
//! rather than calling into any notification layer itself.

use chrono::{DateTime, Utc};

/// Lifecycle state of a reload job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting in the FIFO queue
    Queued,
    /// Remote call dispatched, not yet settled
    InFlight,
    /// Settled (successfully or not)
    Done,
}

/// One unit of reload work
#[derive(Debug, Clone)]
pub struct ReloadJob {
    /// Monotonically increasing id, assigned at enqueue time
    pub id: u64,

    /// Current lifecycle state
    pub state: JobState,

    /// When the job was enqueued
    pub enqueued_at: DateTime<Utc>,
}

impl ReloadJob {
    /// Create a freshly queued job
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: JobState::Queued,
            enqueued_at: Utc::now(),
        }
    }
}

/// How a single reload job settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The remote call returned a success status
    Success {
        /// HTTP-style status code
        status: u16,
        /// Decoded response body
        message: String,
    },

    /// The remote call returned a non-success status or failed outright
    Failure {
        /// Status code, if the call settled with a response at all
        status: Option<u16>,
        /// Decoded response body or transport error message
        message: String,
    },
}

impl JobOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success { .. })
    }

    /// The message carried by this outcome
    pub fn message(&self) -> &str {
        match self {
            JobOutcome::Success { message, .. } => message,
            JobOutcome::Failure { message, .. } => message,
        }
    }
}

/// Events emitted by the coordinator
///
/// Exactly one `BatchStarted` and one `BatchDrained` bracket each busy
/// period, with one `JobFinished` per job in between, in settlement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// The coordinator went from fully idle to busy
    BatchStarted,

    /// One job settled
    JobFinished {
        /// Id assigned at enqueue time
        id: u64,
        /// When the job was enqueued
        enqueued_at: DateTime<Utc>,
        /// How the job settled
        outcome: JobOutcome,
    },

    /// Queue and in-flight set drained back to empty
    BatchDrained,
}
