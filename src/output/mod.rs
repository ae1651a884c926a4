//! Output formatting for benchmark results.
//!
//! Provides multiple output formats:
//! - Clean: Human-readable table format with colors
//! - Json: NDJSON format for machine parsing
//! - Verbose: Tracing-style output with timestamps
//! - Quiet: Minimal single-line output

mod clean;
pub mod format;
mod json;
mod quiet;
mod verbose;

pub use clean::CleanFormatter;
pub use json::JsonFormatter;
pub use quiet::QuietFormatter;
pub use verbose::VerboseFormatter;

use crate::config::{Config, ThroughputBasis};
use crate::runner::{RunError, RunPlan, RunResult};
use chrono::{DateTime, Utc};

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Clean table format with colors (default).
    #[default]
    Clean,
    /// NDJSON format for machine parsing.
    Json,
    /// Verbose tracing-style output.
    Verbose,
    /// Minimal single-line output.
    Quiet,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clean" => Ok(OutputFormat::Clean),
            "json" => Ok(OutputFormat::Json),
            "verbose" => Ok(OutputFormat::Verbose),
            "quiet" => Ok(OutputFormat::Quiet),
            _ => Err(format!(
                "invalid format '{}', expected: clean, json, verbose, quiet",
                s
            )),
        }
    }
}

/// Color mode selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Auto-detect based on TTY and NO_COLOR env var (default).
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            _ => Err(format!(
                "invalid color mode '{}', expected: auto, always, never",
                s
            )),
        }
    }
}

/// A periodic sample taken while the run is in flight.
#[derive(Debug, Clone)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub req_per_sec: f64,
    pub err_per_sec: f64,
    pub workers_active: i64,
    pub p50_us: f64,
    pub p90_us: f64,
    pub p99_us: f64,
    pub p999_us: f64,
    pub p9999_us: f64,
    pub max_us: f64,
}

/// Latency statistics over the whole run.
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub p50_us: f64,
    pub p90_us: f64,
    pub p99_us: f64,
    pub p999_us: f64,
    pub p9999_us: f64,
    pub max_us: f64,
}

/// Final benchmark results.
#[derive(Debug, Clone)]
pub struct Results {
    /// Configured request count.
    pub requests: u64,
    pub attempted: u64,
    pub completed: u64,
    pub failed: u64,
    pub error_responses: u64,
    pub bytes_rx: u64,
    pub workers: usize,
    pub duration_secs: f64,
    pub throughput: f64,
    pub basis: ThroughputBasis,
    pub latencies: LatencyStats,
}

impl Results {
    pub fn new(run: &RunResult, latencies: LatencyStats) -> Self {
        Self {
            requests: run.plan.nominal,
            attempted: run.attempted,
            completed: run.completed,
            failed: run.failed,
            error_responses: run.error_responses,
            bytes_rx: run.bytes_rx,
            workers: run.plan.workers,
            duration_secs: run.elapsed.as_secs_f64(),
            throughput: run.throughput,
            basis: run.basis,
            latencies,
        }
    }

    /// The request count throughput was computed from.
    pub fn throughput_numerator(&self) -> u64 {
        match self.basis {
            ThroughputBasis::Nominal => self.requests,
            ThroughputBasis::Completed => self.completed,
        }
    }

    /// Failed requests as a percentage of attempts.
    pub fn failed_pct(&self) -> f64 {
        if self.attempted > 0 {
            (self.failed as f64 / self.attempted as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Bits per second of drained body data.
    pub fn rx_bps(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.bytes_rx as f64 / self.duration_secs) * 8.0
        } else {
            0.0
        }
    }
}

/// Trait for output formatters.
pub trait OutputFormatter: Send + Sync {
    /// Print the configuration summary at startup.
    fn print_config(&self, config: &Config);

    /// Print the running phase indicator.
    fn print_running(&self, plan: &RunPlan);

    /// Print the table header (for formats that use one).
    fn print_header(&self);

    /// Print a periodic sample.
    fn print_sample(&self, sample: &Sample);

    /// Print the final results.
    fn print_results(&self, results: &Results);

    /// Print a run that ended on a fatal request failure.
    fn print_failure(&self, error: &RunError) {
        println!("RUN FAILED: {}", error);
    }
}

/// Create a formatter based on the output format and color mode.
pub fn create_formatter(format: OutputFormat, color: ColorMode) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Clean => Box::new(CleanFormatter::new(color)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
        OutputFormat::Verbose => Box::new(VerboseFormatter::new()),
        OutputFormat::Quiet => Box::new(QuietFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunPlan;
    use std::time::Duration;

    fn run_result() -> RunResult {
        RunResult {
            plan: RunPlan::new(3, 10),
            attempted: 9,
            completed: 8,
            failed: 1,
            error_responses: 0,
            bytes_rx: 1000,
            elapsed: Duration::from_secs(2),
            basis: ThroughputBasis::Nominal,
            throughput: 5.0,
        }
    }

    #[test]
    fn test_results_from_run() {
        let results = Results::new(&run_result(), LatencyStats::default());
        assert_eq!(results.requests, 10);
        assert_eq!(results.attempted, 9);
        assert_eq!(results.workers, 3);
        assert_eq!(results.duration_secs, 2.0);
        assert_eq!(results.throughput, 5.0);
        assert_eq!(results.rx_bps(), 4000.0);
    }

    #[test]
    fn test_failed_pct() {
        let results = Results::new(&run_result(), LatencyStats::default());
        assert!((results.failed_pct() - 100.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("quiet".parse::<OutputFormat>(), Ok(OutputFormat::Quiet));
        assert!("table".parse::<OutputFormat>().is_err());
        assert_eq!("never".parse::<ColorMode>(), Ok(ColorMode::Never));
        assert!("sometimes".parse::<ColorMode>().is_err());
    }
}
