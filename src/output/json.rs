//! JSON (NDJSON) formatter for machine-readable output.

use super::{OutputFormatter, Results, Sample};
use crate::config::Config;
use crate::runner::{RunError, RunPlan};
use serde::Serialize;

/// JSON formatter outputting NDJSON (newline-delimited JSON).
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ConfigOutput {
    #[serde(rename = "type")]
    msg_type: &'static str,
    target: String,
    mode: String,
    verify_certificates: bool,
    workers: usize,
    requests: u64,
    threads: usize,
    max_idle_per_host: usize,
    on_error: String,
    throughput_basis: String,
}

#[derive(Serialize)]
struct SampleOutput {
    #[serde(rename = "type")]
    msg_type: &'static str,
    ts: String,
    req_s: u64,
    err_s: f64,
    workers_active: i64,
    p50_us: u64,
    p90_us: u64,
    p99_us: u64,
    p999_us: u64,
    p9999_us: u64,
    max_us: u64,
}

#[derive(Serialize)]
struct LatencyOutput {
    p50_us: u64,
    p90_us: u64,
    p99_us: u64,
    p999_us: u64,
    p9999_us: u64,
    max_us: u64,
}

#[derive(Serialize)]
struct ResultsOutput {
    #[serde(rename = "type")]
    msg_type: &'static str,
    requests: u64,
    attempted: u64,
    completed: u64,
    failed: u64,
    error_responses: u64,
    workers: usize,
    elapsed_secs: f64,
    throughput: f64,
    throughput_basis: String,
    rx_bytes: u64,
    latency: LatencyOutput,
}

#[derive(Serialize)]
struct FailureOutput {
    #[serde(rename = "type")]
    msg_type: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    worker: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iteration: Option<u64>,
}

fn emit<T: Serialize>(output: &T) {
    if let Ok(json) = serde_json::to_string(output) {
        println!("{}", json);
    }
}

impl ResultsOutput {
    fn new(results: &Results) -> Self {
        let l = &results.latencies;
        Self {
            msg_type: "result",
            requests: results.requests,
            attempted: results.attempted,
            completed: results.completed,
            failed: results.failed,
            error_responses: results.error_responses,
            workers: results.workers,
            elapsed_secs: results.duration_secs,
            throughput: results.throughput,
            throughput_basis: results.basis.to_string(),
            rx_bytes: results.bytes_rx,
            latency: LatencyOutput {
                p50_us: l.p50_us as u64,
                p90_us: l.p90_us as u64,
                p99_us: l.p99_us as u64,
                p999_us: l.p999_us as u64,
                p9999_us: l.p9999_us as u64,
                max_us: l.max_us as u64,
            },
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn print_config(&self, config: &Config) {
        emit(&ConfigOutput {
            msg_type: "config",
            target: config.target.resolved_url(),
            mode: config.target.mode.to_string(),
            verify_certificates: config.target.mode.verifies_certificates(),
            workers: config.general.workers,
            requests: config.general.requests,
            threads: config.general.threads,
            max_idle_per_host: config.connection.max_idle_per_host,
            on_error: config.workload.on_error.to_string(),
            throughput_basis: config.workload.throughput_basis.to_string(),
        });
    }

    fn print_running(&self, _plan: &RunPlan) {
        // JSON format doesn't print running indicator
    }

    fn print_header(&self) {
        // JSON format doesn't have a header
    }

    fn print_sample(&self, sample: &Sample) {
        emit(&SampleOutput {
            msg_type: "sample",
            ts: sample.timestamp.to_rfc3339(),
            req_s: sample.req_per_sec as u64,
            err_s: sample.err_per_sec,
            workers_active: sample.workers_active,
            p50_us: sample.p50_us as u64,
            p90_us: sample.p90_us as u64,
            p99_us: sample.p99_us as u64,
            p999_us: sample.p999_us as u64,
            p9999_us: sample.p9999_us as u64,
            max_us: sample.max_us as u64,
        });
    }

    fn print_results(&self, results: &Results) {
        emit(&ResultsOutput::new(results));
    }

    fn print_failure(&self, error: &RunError) {
        let (worker, iteration) = match error {
            RunError::Request {
                worker, iteration, ..
            } => (Some(*worker), Some(*iteration)),
            RunError::Worker(_) => (None, None),
        };
        emit(&FailureOutput {
            msg_type: "failure",
            error: error.to_string(),
            worker,
            iteration,
        });
    }
}
