//! Clean table formatter with optional color output.

use super::format::{
    format_bandwidth_bps, format_count, format_latency_padded, format_pct, format_rate,
    format_rate_padded,
};
use super::{ColorMode, OutputFormatter, Results, Sample};
use crate::config::Config;
use crate::runner::{RunError, RunPlan};
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of sample rows between header reprints.
const HEADER_REPEAT_INTERVAL: u64 = 25;

const RULE: &str =
    "─────────────────────────────────────────────────────────────────────────────────────";

/// ANSI escape codes for colors.
mod ansi {
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RESET: &str = "\x1b[0m";
}

/// Clean table formatter with optional color support.
pub struct CleanFormatter {
    use_color: bool,
    sample_count: AtomicU64,
}

impl CleanFormatter {
    pub fn new(color_mode: ColorMode) -> Self {
        let use_color = match color_mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
        };
        Self {
            use_color,
            sample_count: AtomicU64::new(0),
        }
    }

    fn paint(&self, color: &str, s: &str) -> String {
        if self.use_color {
            format!("{}{}{}", color, s, ansi::RESET)
        } else {
            s.to_string()
        }
    }

    fn red(&self, s: &str) -> String {
        self.paint(ansi::RED, s)
    }

    fn maybe_red(&self, s: &str, condition: bool) -> String {
        if condition {
            self.red(s)
        } else {
            s.to_string()
        }
    }
}

impl OutputFormatter for CleanFormatter {
    fn print_config(&self, config: &Config) {
        println!("headcannon");
        println!("──────────────────");

        let mode = config.target.mode;
        let mode_str = if mode.is_tls() && !mode.verifies_certificates() {
            self.paint(ansi::YELLOW, &format!("{} (certificates NOT verified)", mode))
        } else {
            mode.to_string()
        };
        println!("target     {} ({})", config.target.resolved_url(), mode_str);
        println!(
            "workload   {} HEAD requests, {} workers",
            format_count(config.general.requests),
            config.general.workers
        );
        println!("threads    {}", config.general.threads);
        println!(
            "pool       {} idle/host, connect {}ms, timeout {}ms",
            config.connection.max_idle_per_host,
            config.connection.connect_timeout.as_millis(),
            config.connection.request_timeout.as_millis()
        );
        println!("on error   {}", config.workload.on_error);

        println!();
    }

    fn print_running(&self, plan: &RunPlan) {
        println!(
            "[running {} x {} requests]",
            plan.workers,
            format_count(plan.per_worker)
        );
        if plan.dropped() > 0 {
            println!(
                "{}",
                self.paint(
                    ansi::YELLOW,
                    &format!(
                        "[{} requests dropped: {} not divisible by {} workers]",
                        plan.dropped(),
                        plan.nominal,
                        plan.workers
                    )
                )
            );
        }
        println!();
    }

    fn print_header(&self) {
        println!(
            "time UTC │ req/s │ err/s │ wrk │    p50 │    p90 │    p99 │  p99.9 │ p99.99 │    max"
        );
        println!(
            "─────────┼───────┼───────┼─────┼────────┼────────┼────────┼────────┼────────┼───────"
        );
        let _ = io::stdout().flush();
    }

    fn print_sample(&self, sample: &Sample) {
        let count = self.sample_count.fetch_add(1, Ordering::Relaxed);
        if count > 0 && count.is_multiple_of(HEADER_REPEAT_INTERVAL) {
            println!(
                "─────────┼───────┼───────┼─────┼────────┼────────┼────────┼────────┼────────┼───────"
            );
            self.print_header();
        }

        let time = sample.timestamp.format("%H:%M:%S");
        let rate = format_rate_padded(sample.req_per_sec, 5);
        let err = format_rate_padded(sample.err_per_sec, 5);
        let err_colored = self.maybe_red(&err, sample.err_per_sec > 0.0);

        println!(
            "{} │ {} │ {} │{:>4} │{} │{} │{} │{} │{} │{}",
            time,
            rate,
            err_colored,
            sample.workers_active,
            format_latency_padded(sample.p50_us, 7),
            format_latency_padded(sample.p90_us, 7),
            format_latency_padded(sample.p99_us, 7),
            format_latency_padded(sample.p999_us, 7),
            format_latency_padded(sample.p9999_us, 7),
            format_latency_padded(sample.max_us, 7),
        );
        let _ = io::stdout().flush();
    }

    fn print_results(&self, results: &Results) {
        println!();
        println!("{}", RULE);
        println!("RESULTS ({:.2}s)", results.duration_secs);
        println!("{}", RULE);

        println!(
            "throughput   {} req/s ({} {} requests in {:.3}s)",
            format_rate(results.throughput),
            format_count(results.throughput_numerator()),
            results.basis,
            results.duration_secs
        );

        let failed_str = format!(
            "{} failed ({}%)",
            format_count(results.failed),
            format_pct(results.failed_pct())
        );
        println!(
            "requests     {} sent, {} completed, {}",
            format_count(results.attempted),
            format_count(results.completed),
            self.maybe_red(&failed_str, results.failed > 0)
        );
        if results.error_responses > 0 {
            println!(
                "status       {}",
                self.red(&format!("{} non-2xx responses", format_count(results.error_responses)))
            );
        }
        if results.bytes_rx > 0 {
            println!("bandwidth    {} RX", format_bandwidth_bps(results.rx_bps()));
        }

        println!();

        println!(
            "latency      {:>6}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}",
            "p50", "p90", "p99", "p99.9", "p99.99", "max"
        );
        let stats = &results.latencies;
        println!(
            "{:<12} {:>6}  {:>6}  {:>6}  {:>6}  {:>6}  {:>6}",
            "HEAD",
            format_latency_padded(stats.p50_us, 6),
            format_latency_padded(stats.p90_us, 6),
            format_latency_padded(stats.p99_us, 6),
            format_latency_padded(stats.p999_us, 6),
            format_latency_padded(stats.p9999_us, 6),
            format_latency_padded(stats.max_us, 6),
        );
    }

    fn print_failure(&self, error: &RunError) {
        println!();
        println!("{}", self.red(RULE));
        println!("{}", self.red("RUN FAILED"));
        println!("{}", self.red(RULE));
        println!("{}", self.red(&error.to_string()));
        println!();
        println!("hint: check that the server is running and reachable");
        println!("hint: use on_error = \"skip\" to keep going past failed requests");
        let _ = io::stdout().flush();
    }
}
