//! Process-wide benchmark metrics.
//!
//! These are registered with `metriken` and read by the progress sampler and
//! the Prometheus endpoint. Per-run totals live in [`crate::worker::SharedState`].

use metriken::{AtomicHistogram, Counter, Gauge, metric};

// Request counters
#[metric(name = "requests_sent", description = "Total HEAD requests sent")]
pub static REQUESTS_SENT: Counter = Counter::new();

#[metric(
    name = "responses_received",
    description = "Total responses received with the body fully drained"
)]
pub static RESPONSES_RECEIVED: Counter = Counter::new();

#[metric(name = "request_errors", description = "Total failed requests")]
pub static REQUEST_ERRORS: Counter = Counter::new();

#[metric(
    name = "error_responses",
    description = "Responses with a non-2xx status code"
)]
pub static ERROR_RESPONSES: Counter = Counter::new();

// Failure breakdown
#[metric(
    name = "connect_errors",
    description = "Requests that failed to establish a connection"
)]
pub static CONNECT_ERRORS: Counter = Counter::new();

#[metric(name = "request_timeouts", description = "Requests that timed out")]
pub static REQUEST_TIMEOUTS: Counter = Counter::new();

#[metric(name = "bytes_rx", description = "Total response body bytes drained")]
pub static BYTES_RX: Counter = Counter::new();

#[metric(name = "workers_active", description = "Workers currently issuing requests")]
pub static WORKERS_ACTIVE: Gauge = Gauge::new();

#[metric(
    name = "response_latency",
    description = "HEAD response latency histogram (nanoseconds)"
)]
pub static RESPONSE_LATENCY: AtomicHistogram = AtomicHistogram::new(7, 64);
