//! Periodic progress samples and latency summaries read from the global metrics.

use crate::metrics;
use crate::output::{LatencyStats, Sample};

use chrono::Utc;
use metriken::AtomicHistogram;
use metriken::histogram::Histogram;
use std::time::Instant;

/// Computes per-interval rates from the global counters.
pub struct Sampler {
    last_at: Instant,
    last_responses: u64,
    last_errors: u64,
    last_histogram: Option<Histogram>,
}

impl Sampler {
    /// Start sampling from the current counter values.
    pub fn new() -> Self {
        Self {
            last_at: Instant::now(),
            last_responses: metrics::RESPONSES_RECEIVED.value(),
            last_errors: metrics::REQUEST_ERRORS.value(),
            last_histogram: metrics::RESPONSE_LATENCY.load(),
        }
    }

    /// Take a sample covering the time since the previous one.
    pub fn sample(&mut self) -> Sample {
        let now = Instant::now();
        let elapsed_secs = now.duration_since(self.last_at).as_secs_f64();

        let responses = metrics::RESPONSES_RECEIVED.value();
        let errors = metrics::REQUEST_ERRORS.value();

        let (req_per_sec, err_per_sec) = if elapsed_secs > 0.0 {
            (
                responses.saturating_sub(self.last_responses) as f64 / elapsed_secs,
                errors.saturating_sub(self.last_errors) as f64 / elapsed_secs,
            )
        } else {
            (0.0, 0.0)
        };

        let current = metrics::RESPONSE_LATENCY.load();
        let stats = match (&current, &self.last_histogram) {
            (Some(current), Some(previous)) => match current.wrapping_sub(previous) {
                Ok(delta) => stats_from_histogram(&delta),
                Err(_) => LatencyStats::default(),
            },
            (Some(current), None) => stats_from_histogram(current),
            _ => LatencyStats::default(),
        };

        self.last_at = now;
        self.last_responses = responses;
        self.last_errors = errors;
        self.last_histogram = current;

        Sample {
            timestamp: Utc::now(),
            req_per_sec,
            err_per_sec,
            workers_active: metrics::WORKERS_ACTIVE.value(),
            p50_us: stats.p50_us,
            p90_us: stats.p90_us,
            p99_us: stats.p99_us,
            p999_us: stats.p999_us,
            p9999_us: stats.p9999_us,
            max_us: stats.max_us,
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative latency statistics from a histogram, in microseconds.
pub fn latency_stats(hist: &AtomicHistogram) -> LatencyStats {
    match hist.load() {
        Some(snapshot) => stats_from_histogram(&snapshot),
        None => LatencyStats::default(),
    }
}

fn stats_from_histogram(hist: &Histogram) -> LatencyStats {
    LatencyStats {
        p50_us: percentile_from_histogram(hist, 50.0) / 1000.0,
        p90_us: percentile_from_histogram(hist, 90.0) / 1000.0,
        p99_us: percentile_from_histogram(hist, 99.0) / 1000.0,
        p999_us: percentile_from_histogram(hist, 99.9) / 1000.0,
        p9999_us: percentile_from_histogram(hist, 99.99) / 1000.0,
        max_us: percentile_from_histogram(hist, 100.0) / 1000.0,
    }
}

/// Upper bucket bound for percentile `p`, or 0 for an empty histogram.
fn percentile_from_histogram(hist: &Histogram, p: f64) -> f64 {
    if let Ok(Some(results)) = hist.percentiles(&[p])
        && let Some((_pct, bucket)) = results.first()
    {
        return bucket.end() as f64;
    }
    0.0
}
