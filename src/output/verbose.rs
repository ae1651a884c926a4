//! Verbose tracing-style formatter.

use super::format::{format_bandwidth_bps, format_pct};
use super::{OutputFormatter, Results, Sample};
use crate::config::Config;
use crate::runner::{RunError, RunPlan};

/// Verbose formatter using tracing-style output.
pub struct VerboseFormatter;

impl VerboseFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VerboseFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for VerboseFormatter {
    fn print_config(&self, config: &Config) {
        tracing::info!("starting headcannon");
        tracing::info!("target: {}", config.target.resolved_url());
        tracing::info!("mode: {}", config.target.mode);
        tracing::info!("workers: {}", config.general.workers);
        tracing::info!("requests: {}", config.general.requests);
        tracing::info!("threads: {}", config.general.threads);
        tracing::info!("max_idle_per_host: {}", config.connection.max_idle_per_host);
        tracing::info!("on_error: {}", config.workload.on_error);
    }

    fn print_running(&self, plan: &RunPlan) {
        tracing::info!(
            "running {} workers x {} requests",
            plan.workers,
            plan.per_worker
        );
    }

    fn print_header(&self) {
        // Verbose format doesn't use a table header
    }

    fn print_sample(&self, sample: &Sample) {
        tracing::info!(
            "rate={:.0}/s err={:.0}/s workers={} p50={:.0}us p90={:.0}us p99={:.0}us p99.9={:.0}us p99.99={:.0}us max={:.0}us",
            sample.req_per_sec,
            sample.err_per_sec,
            sample.workers_active,
            sample.p50_us,
            sample.p90_us,
            sample.p99_us,
            sample.p999_us,
            sample.p9999_us,
            sample.max_us,
        );
    }

    fn print_results(&self, results: &Results) {
        tracing::info!(
            "{} HTTP requests in {} seconds, {} rps",
            results.requests,
            results.duration_secs,
            results.throughput
        );
        tracing::info!("throughput_basis: {}", results.basis);
        tracing::info!(
            "sent: {}, completed: {}, failed: {} ({}%)",
            results.attempted,
            results.completed,
            results.failed,
            format_pct(results.failed_pct())
        );
        if results.error_responses > 0 {
            tracing::warn!("non-2xx responses: {}", results.error_responses);
        }
        tracing::info!("bandwidth: {} RX", format_bandwidth_bps(results.rx_bps()));
        tracing::info!(
            "HEAD latency: p50={:.0}us p90={:.0}us p99={:.0}us p99.9={:.0}us p99.99={:.0}us max={:.0}us",
            results.latencies.p50_us,
            results.latencies.p90_us,
            results.latencies.p99_us,
            results.latencies.p999_us,
            results.latencies.p9999_us,
            results.latencies.max_us,
        );
    }

    fn print_failure(&self, error: &RunError) {
        tracing::error!("run failed: {}", error);
    }
}
