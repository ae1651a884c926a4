pub mod admin;
pub mod client;
pub mod config;
pub mod metrics;
pub mod output;
pub mod runner;
pub mod sampler;
pub mod worker;

pub use admin::{AdminHandle, AdminServer};
pub use client::{HeadResponse, HttpTransport, RequestFailure, Transport};
pub use config::{Config, ErrorPolicy, ThroughputBasis, TransportMode};
pub use output::{
    ColorMode, LatencyStats, OutputFormat, OutputFormatter, Results, Sample, create_formatter,
};
pub use runner::{LoadGenerator, RunError, RunPlan, RunResult};
pub use sampler::Sampler;
pub use worker::SharedState;
