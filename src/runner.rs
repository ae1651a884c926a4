//! The load generator: partitions the request count across workers, runs them
//! concurrently, waits for all of them and derives throughput.

use crate::client::{ClientError, HttpTransport, RequestFailure, Transport};
use crate::config::{Config, ErrorPolicy, ThroughputBasis};
use crate::worker::{SharedState, WorkerReport, run_worker};

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// How the request count is split across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub workers: usize,
    /// Iterations per worker (`requests / workers`, truncated).
    pub per_worker: u64,
    /// The configured request count.
    pub nominal: u64,
}

impl RunPlan {
    pub fn new(workers: usize, requests: u64) -> Self {
        let per_worker = if workers == 0 {
            0
        } else {
            requests / workers as u64
        };
        Self {
            workers,
            per_worker,
            nominal: requests,
        }
    }

    /// Requests that will actually be issued.
    #[inline]
    pub fn attempts(&self) -> u64 {
        self.per_worker * self.workers as u64
    }

    /// Requests lost to integer division.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.nominal - self.attempts()
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub plan: RunPlan,
    pub attempted: u64,
    pub completed: u64,
    pub failed: u64,
    pub error_responses: u64,
    pub bytes_rx: u64,
    pub elapsed: Duration,
    pub basis: ThroughputBasis,
    /// Requests per second, using the numerator selected by `basis`.
    pub throughput: f64,
}

impl RunResult {
    /// The request count throughput was computed from.
    pub fn throughput_numerator(&self) -> u64 {
        match self.basis {
            ThroughputBasis::Nominal => self.plan.nominal,
            ThroughputBasis::Completed => self.completed,
        }
    }
}

/// Requests per second for `count` requests over `elapsed`.
pub fn throughput(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { count as f64 / secs } else { 0.0 }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("worker {worker} failed on iteration {iteration}: {source}")]
    Request {
        worker: usize,
        iteration: u64,
        #[source]
        source: RequestFailure,
    },
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Drives one run against a shared [`Transport`].
pub struct LoadGenerator<T: Transport> {
    transport: Arc<T>,
    plan: RunPlan,
    policy: ErrorPolicy,
    basis: ThroughputBasis,
    shared: Arc<SharedState>,
}

impl LoadGenerator<HttpTransport> {
    /// Build a generator using a pooled HTTP client configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(
            transport,
            RunPlan::new(config.general.workers, config.general.requests),
            config.workload.on_error,
            config.workload.throughput_basis,
        ))
    }
}

impl<T: Transport> LoadGenerator<T> {
    pub fn new(transport: T, plan: RunPlan, policy: ErrorPolicy, basis: ThroughputBasis) -> Self {
        Self {
            transport: Arc::new(transport),
            plan,
            policy,
            basis,
            shared: Arc::new(SharedState::new()),
        }
    }

    pub fn plan(&self) -> RunPlan {
        self.plan
    }

    /// Live counters for this run.
    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Execute the run to completion.
    ///
    /// Under [`ErrorPolicy::Fatal`] the first failure is returned as soon as it
    /// is observed. The remaining workers are detached, not cancelled: they run
    /// until their own loop ends or they fail themselves.
    pub async fn run(&self) -> Result<RunResult, RunError> {
        let plan = self.plan;

        if plan.dropped() > 0 {
            tracing::warn!(
                requests = plan.nominal,
                workers = plan.workers,
                "{} requests not divisible across workers, {} will not be sent",
                plan.nominal,
                plan.dropped()
            );
        }

        tracing::debug!(
            workers = plan.workers,
            per_worker = plan.per_worker,
            policy = %self.policy,
            "launching workers"
        );

        let start = Instant::now();

        let mut tasks = JoinSet::new();
        for id in 0..plan.workers {
            tasks.spawn(run_worker(
                id,
                Arc::clone(&self.transport),
                plan.per_worker,
                self.policy,
                Arc::clone(&self.shared),
            ));
        }

        let mut reports: Vec<WorkerReport> = Vec::with_capacity(plan.workers);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    tracing::error!("aborting run: {}", e);
                    tasks.detach_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.detach_all();
                    return Err(RunError::Worker(e.to_string()));
                }
            }
        }

        let elapsed = start.elapsed();

        let attempted = reports.iter().map(|r| r.attempted).sum();
        let completed = reports.iter().map(|r| r.completed).sum();
        let failed = reports.iter().map(|r| r.failed).sum();

        let mut result = RunResult {
            plan,
            attempted,
            completed,
            failed,
            error_responses: self.shared.error_responses(),
            bytes_rx: self.shared.bytes_rx(),
            elapsed,
            basis: self.basis,
            throughput: 0.0,
        };
        result.throughput = throughput(result.throughput_numerator(), elapsed);

        tracing::debug!(
            attempted,
            completed,
            failed,
            elapsed_secs = elapsed.as_secs_f64(),
            "all workers joined"
        );

        Ok(result)
    }
}
