//! Worker loop.
//!
//! Each worker issues its share of HEAD requests strictly one after another:
//! request N+1 is not sent until request N's body has been drained and its
//! connection released. Workers share one [`Transport`] and one [`SharedState`].

use crate::client::{FailureKind, HeadResponse, RequestFailure, Transport};
use crate::config::ErrorPolicy;
use crate::metrics;
use crate::runner::RunError;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Per-run counters shared by all workers of a run.
pub struct SharedState {
    /// Requests issued (successful or not)
    attempted: AtomicU64,
    /// Requests whose response body was drained
    completed: AtomicU64,
    /// Requests that failed before completing
    failed: AtomicU64,
    /// Completed requests with a non-2xx status
    error_responses: AtomicU64,
    /// Body bytes drained
    bytes_rx: AtomicU64,
    /// Workers currently inside their request loop
    active: AtomicUsize,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            attempted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            error_responses: AtomicU64::new(0),
            bytes_rx: AtomicU64::new(0),
            active: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn attempted(&self) -> u64 {
        self.attempted.load(Ordering::Acquire)
    }

    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn error_responses(&self) -> u64 {
        self.error_responses.load(Ordering::Acquire)
    }

    #[inline]
    pub fn bytes_rx(&self) -> u64 {
        self.bytes_rx.load(Ordering::Acquire)
    }

    /// Number of workers still running.
    #[inline]
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    fn record_attempt(&self) {
        self.attempted.fetch_add(1, Ordering::Release);
        metrics::REQUESTS_SENT.increment();
    }

    fn record_response(&self, response: &HeadResponse, latency_ns: u64) {
        self.completed.fetch_add(1, Ordering::Release);
        self.bytes_rx.fetch_add(response.body_bytes, Ordering::Release);
        metrics::RESPONSES_RECEIVED.increment();
        metrics::BYTES_RX.add(response.body_bytes);
        let _ = metrics::RESPONSE_LATENCY.increment(latency_ns);

        if !response.is_success() {
            self.error_responses.fetch_add(1, Ordering::Release);
            metrics::ERROR_RESPONSES.increment();
        }
    }

    fn record_failure(&self, failure: &RequestFailure) {
        self.failed.fetch_add(1, Ordering::Release);
        metrics::REQUEST_ERRORS.increment();
        match failure.kind {
            FailureKind::Connect => {
                metrics::CONNECT_ERRORS.increment();
            }
            FailureKind::Timeout => {
                metrics::REQUEST_TIMEOUTS.increment();
            }
            FailureKind::Body | FailureKind::Other => {}
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the active-worker gauges accurate even if the worker task is aborted.
struct ActiveGuard<'a> {
    shared: &'a SharedState,
}

impl<'a> ActiveGuard<'a> {
    fn enter(shared: &'a SharedState) -> Self {
        shared.active.fetch_add(1, Ordering::AcqRel);
        metrics::WORKERS_ACTIVE.increment();
        Self { shared }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.shared.active.fetch_sub(1, Ordering::AcqRel);
        metrics::WORKERS_ACTIVE.decrement();
    }
}

/// What one worker did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub attempted: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Run `iterations` sequential HEAD requests.
///
/// Under [`ErrorPolicy::Fatal`] the first failure is returned and the worker
/// stops. Under [`ErrorPolicy::Skip`] the failure is counted and the loop
/// continues with the next iteration.
pub async fn run_worker<T: Transport>(
    id: usize,
    transport: Arc<T>,
    iterations: u64,
    policy: ErrorPolicy,
    shared: Arc<SharedState>,
) -> Result<WorkerReport, RunError> {
    let _active = ActiveGuard::enter(&shared);
    let mut report = WorkerReport {
        id,
        ..Default::default()
    };

    tracing::trace!(worker = id, iterations, "worker started");

    for iteration in 0..iterations {
        shared.record_attempt();
        report.attempted += 1;

        let sent_at = Instant::now();
        match transport.head().await {
            Ok(response) => {
                let latency_ns = sent_at.elapsed().as_nanos() as u64;
                shared.record_response(&response, latency_ns);
                report.completed += 1;
            }
            Err(failure) => {
                shared.record_failure(&failure);
                report.failed += 1;

                match policy {
                    ErrorPolicy::Fatal => {
                        tracing::debug!(worker = id, iteration, "request failed: {}", failure);
                        return Err(RunError::Request {
                            worker: id,
                            iteration,
                            source: failure,
                        });
                    }
                    ErrorPolicy::Skip => {
                        tracing::trace!(worker = id, iteration, "skipping failed request: {}", failure);
                    }
                }
            }
        }
    }

    tracing::trace!(
        worker = id,
        completed = report.completed,
        failed = report.failed,
        "worker finished"
    );

    Ok(report)
}
