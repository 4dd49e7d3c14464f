//! Reload coordinator - serializes remote reload requests
//!
//! The coordinator is responsible for:
//! - Assigning job ids and queuing reload requests (FIFO)
//! - Dispatching at most one remote reload call at a time
//! - Holding a page-unload guard while any work is outstanding
//! - Emitting typed events for each settlement and for batch start/drain
//!
//! A job enqueued while another is in flight waits in the queue and is
//! dispatched only after the previous call has settled. A failing reload
//! does not abort the queue; each job settles independently.

use crate::error::{ReloadError, ReloadResult};
use crate::reload::job::{JobOutcome, JobState, ReloadEvent, ReloadJob};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Settled response of a remote reload call
#[derive(Debug, Clone)]
pub struct ReloadResponse {
    /// HTTP-style status code
    pub status: u16,

    /// Decoded response body
    pub body: String,
}

impl ReloadResponse {
    /// Returns true if the status indicates success
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport performing the remote reload operation
#[async_trait::async_trait]
pub trait ReloadTransport: Send + Sync {
    /// Issue one reload request and wait for it to settle
    async fn perform_reload(&self) -> ReloadResult<ReloadResponse>;
}

/// Guard preventing page navigation while reload work is outstanding
///
/// Both methods are synchronous and idempotent. They are invoked while the
/// coordinator holds its internal lock, so implementations must not call
/// back into the coordinator.
pub trait UnloadGuard: Send + Sync {
    /// Arm the guard (e.g. install a beforeunload handler)
    fn register(&self);

    /// Disarm the guard
    fn unregister(&self);
}

/// Guard implementation for embedders without a page to protect
#[derive(Debug, Default)]
pub struct NullUnloadGuard;

impl UnloadGuard for NullUnloadGuard {
    fn register(&self) {}
    fn unregister(&self) {}
}

/// Receiver for coordinator events
///
/// `notify` is synchronous and fire-and-forget. It is invoked while the
/// coordinator holds its internal lock, so implementations must not call
/// back into the coordinator; hand the event off if more work is needed.
pub trait ReloadObserver: Send + Sync {
    /// Deliver one event
    fn notify(&self, event: ReloadEvent);
}

/// Observer that maps events to structured log records
///
/// Stands in for a presentation layer: job successes are logged at info,
/// failures at error, batch transitions at debug.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ReloadObserver for TracingObserver {
    fn notify(&self, event: ReloadEvent) {
        match event {
            ReloadEvent::BatchStarted => debug!("Reload batch started"),
            ReloadEvent::JobFinished { id, outcome, .. } => {
                if outcome.is_success() {
                    info!(job = id, message = outcome.message(), "Reload succeeded");
                } else {
                    error!(job = id, message = outcome.message(), "Reload failed");
                }
            }
            ReloadEvent::BatchDrained => debug!("Reload batch drained"),
        }
    }
}

/// Counters accumulated over the coordinator's lifetime
#[derive(Debug, Default)]
pub struct ReloadStats {
    /// Jobs accepted by `enqueue`
    pub jobs_enqueued: AtomicU64,

    /// Jobs settled successfully
    pub jobs_succeeded: AtomicU64,

    /// Jobs settled with a failure
    pub jobs_failed: AtomicU64,
}

impl ReloadStats {
    fn record_enqueue(&self) {
        self.jobs_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    fn record_outcome(&self, outcome: &JobOutcome) {
        if outcome.is_success() {
            self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Mutable coordinator state
///
/// A job lives in exactly one of `queue` or `in_flight`. `in_flight` holds
/// at most one entry by construction: the driver moves a job in only after
/// the previous one has been removed.
#[derive(Debug, Default)]
struct CoordinatorState {
    /// Next job id to assign
    next_id: u64,

    /// Jobs awaiting dispatch, in arrival order
    queue: VecDeque<ReloadJob>,

    /// Job currently being serviced, keyed by id
    in_flight: HashMap<u64, ReloadJob>,

    /// Whether a driver task is running
    driver_active: bool,
}

impl CoordinatorState {
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }
}

struct CoordinatorInner {
    transport: Arc<dyn ReloadTransport>,
    guard: Arc<dyn UnloadGuard>,
    observer: Arc<dyn ReloadObserver>,
    state: Mutex<CoordinatorState>,
    stats: ReloadStats,
}

impl CoordinatorInner {
    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().expect("Coordinator state poisoned")
    }
}

/// Serializes reload requests through a single-slot in-flight set
///
/// Cloning the coordinator is cheap and shares the same state.
#[derive(Clone)]
pub struct ReloadCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl ReloadCoordinator {
    /// Create a coordinator around the given collaborators
    pub fn new(
        transport: Arc<dyn ReloadTransport>,
        guard: Arc<dyn UnloadGuard>,
        observer: Arc<dyn ReloadObserver>,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                transport,
                guard,
                observer,
                state: Mutex::new(CoordinatorState::default()),
                stats: ReloadStats::default(),
            }),
        }
    }

    /// Enqueue one reload job, returning its assigned id
    ///
    /// If this transitions the coordinator from fully idle to busy, the
    /// unload guard is armed and `BatchStarted` is emitted. Must be called
    /// from within a tokio runtime; the driver task is spawned here when
    /// none is running.
    pub fn enqueue(&self) -> u64 {
        let inner = &self.inner;
        let mut state = inner.lock();

        // A settling driver briefly leaves both queue and in_flight empty
        // before it reacquires the lock to pick up the next job or drain.
        // That window belongs to the same busy period: a new batch begins
        // only when no driver is running.
        let was_idle = state.is_idle() && !state.driver_active;

        let id = state.next_id;
        state.next_id += 1;
        state.queue.push_back(ReloadJob::new(id));
        inner.stats.record_enqueue();

        if was_idle {
            inner.guard.register();
            inner.observer.notify(ReloadEvent::BatchStarted);
        }

        debug!(job = id, queued = state.queue.len(), "Reload job enqueued");

        self.spawn_driver_if_needed(&mut state);
        id
    }

    /// Re-trigger queue processing
    ///
    /// A no-op when the coordinator is idle or a driver is already running:
    /// no duplicate drain events, no duplicate guard unregistration.
    pub fn pump(&self) {
        let mut state = self.inner.lock();
        self.spawn_driver_if_needed(&mut state);
    }

    /// True when no job is queued or in flight
    pub fn is_idle(&self) -> bool {
        self.inner.lock().is_idle()
    }

    /// Number of jobs waiting for dispatch
    pub fn queued_len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Lifetime counters
    pub fn stats(&self) -> &ReloadStats {
        &self.inner.stats
    }

    fn spawn_driver_if_needed(&self, state: &mut CoordinatorState) {
        if state.driver_active || state.queue.is_empty() {
            return;
        }
        state.driver_active = true;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(drive(inner));
    }
}

/// Driver loop: dispatch the head job, await settlement, repeat
///
/// Only one driver runs at a time (`driver_active`), which is what makes
/// dispatch strictly sequential. On drain the driver disarms the unload
/// guard, emits `BatchDrained`, resets the id counter and exits; the next
/// `enqueue` starts a fresh batch.
async fn drive(inner: Arc<CoordinatorInner>) {
    loop {
        let job = {
            let mut state = inner.lock();
            match state.queue.pop_front() {
                Some(mut job) => {
                    job.state = JobState::InFlight;
                    state.in_flight.insert(job.id, job.clone());
                    job
                }
                None => {
                    // Queue drained and nothing in flight: reset for the
                    // next batch before releasing the lock so a concurrent
                    // enqueue sees a fully idle coordinator.
                    debug_assert!(state.in_flight.is_empty());
                    state.driver_active = false;
                    state.next_id = 0;
                    inner.guard.unregister();
                    inner.observer.notify(ReloadEvent::BatchDrained);
                    info!("Reload queue drained");
                    return;
                }
            }
        };

        debug!(job = job.id, "Dispatching reload");

        let outcome = match inner.transport.perform_reload().await {
            Ok(response) if response.is_success() => JobOutcome::Success {
                status: response.status,
                message: response.body,
            },
            Ok(response) => JobOutcome::Failure {
                status: Some(response.status),
                message: response.body,
            },
            Err(ReloadError::RequestFailed { reason }) => JobOutcome::Failure {
                status: None,
                message: reason,
            },
        };

        inner.stats.record_outcome(&outcome);

        {
            let mut state = inner.lock();
            if let Some(mut done) = state.in_flight.remove(&job.id) {
                done.state = JobState::Done;
                let waited_ms = (chrono::Utc::now() - done.enqueued_at).num_milliseconds();
                debug!(
                    job = done.id,
                    success = outcome.is_success(),
                    waited_ms = waited_ms,
                    "Reload job settled"
                );
            }
            inner.observer.notify(ReloadEvent::JobFinished {
                id: job.id,
                enqueued_at: job.enqueued_at,
                outcome,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OkTransport;

    #[async_trait::async_trait]
    impl ReloadTransport for OkTransport {
        async fn perform_reload(&self) -> ReloadResult<ReloadResponse> {
            Ok(ReloadResponse {
                status: 200,
                body: "ok".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<ReloadEvent>>,
    }

    impl ReloadObserver for RecordingObserver {
        fn notify(&self, event: ReloadEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn coordinator_with_observer() -> (ReloadCoordinator, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let coordinator = ReloadCoordinator::new(
            Arc::new(OkTransport),
            Arc::new(NullUnloadGuard),
            Arc::clone(&observer) as Arc<dyn ReloadObserver>,
        );
        (coordinator, observer)
    }

    #[test]
    fn test_response_success_range() {
        let ok = ReloadResponse {
            status: 204,
            body: String::new(),
        };
        assert!(ok.is_success());

        let err = ReloadResponse {
            status: 500,
            body: "boom".into(),
        };
        assert!(!err.is_success());
    }

    #[tokio::test]
    async fn test_pump_when_idle_is_noop() {
        let (coordinator, observer) = coordinator_with_observer();

        coordinator.pump();
        coordinator.pump();

        assert!(coordinator.is_idle());
        assert!(observer.events.lock().unwrap().is_empty());
    }

    async fn wait_for_drain(observer: &RecordingObserver) {
        loop {
            if observer
                .events
                .lock()
                .unwrap()
                .iter()
                .any(|e| *e == ReloadEvent::BatchDrained)
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_single_job_settles_and_drains() {
        let (coordinator, observer) = coordinator_with_observer();

        let id = coordinator.enqueue();
        assert_eq!(id, 0);

        wait_for_drain(&observer).await;
        assert!(coordinator.is_idle());
        assert_eq!(coordinator.stats().jobs_succeeded.load(Ordering::Relaxed), 1);

        let events = observer.events.lock().unwrap();
        assert_eq!(events[0], ReloadEvent::BatchStarted);
        assert!(matches!(events[1], ReloadEvent::JobFinished { id: 0, .. }));
        assert_eq!(events[2], ReloadEvent::BatchDrained);
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn test_id_counter_resets_after_drain() {
        let (coordinator, observer) = coordinator_with_observer();

        coordinator.enqueue();
        wait_for_drain(&observer).await;

        let id = coordinator.enqueue();
        assert_eq!(id, 0);
    }
}
