//! Quiet formatter with minimal single-line output.

use super::format::{format_count, format_latency_us, format_rate};
use super::{OutputFormatter, Results, Sample};
use crate::config::Config;
use crate::runner::RunPlan;

/// Quiet formatter that only outputs final results on a single line.
pub struct QuietFormatter;

impl QuietFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for QuietFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for QuietFormatter {
    fn print_config(&self, _config: &Config) {}

    fn print_running(&self, _plan: &RunPlan) {}

    fn print_header(&self) {}

    fn print_sample(&self, _sample: &Sample) {}

    fn print_results(&self, results: &Results) {
        // Single line: requests, elapsed, throughput, key latencies
        println!(
            "{} req in {:.3}s  {} req/s  {} failed  p50={} p99={} max={}",
            format_count(results.requests),
            results.duration_secs,
            format_rate(results.throughput),
            results.failed,
            format_latency_us(results.latencies.p50_us),
            format_latency_us(results.latencies.p99_us),
            format_latency_us(results.latencies.max_us),
        );
    }
}
