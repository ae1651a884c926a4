use headcannon::config::{Config, ErrorPolicy, TransportMode};
use headcannon::{
    AdminServer, LoadGenerator, OutputFormat, OutputFormatter, Results, Sampler, create_formatter,
    metrics, sampler,
};

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "headcannon")]
#[command(about = "Concurrent HTTP HEAD load generator")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Total number of requests, split evenly across workers
    #[arg(long)]
    requests: Option<u64>,

    /// Target URL
    #[arg(long, value_name = "URL")]
    target: Option<String>,

    /// Transport mode: plain, tls-insecure, http2-insecure, tls, http2
    #[arg(long)]
    mode: Option<TransportMode>,

    /// What to do when a request fails: fatal, skip
    #[arg(long, value_name = "POLICY")]
    on_error: Option<ErrorPolicy>,

    /// Output format: clean, json, verbose, quiet
    #[arg(long)]
    format: Option<OutputFormat>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.general.workers = workers;
        }
        if let Some(requests) = self.requests {
            config.general.requests = requests;
        }
        if let Some(ref target) = self.target {
            config.target.url = Some(target.clone());
        }
        if let Some(mode) = self.mode {
            config.target.mode = mode;
        }
        if let Some(on_error) = self.on_error {
            config.workload.on_error = on_error;
        }
        if let Some(format) = self.format {
            config.admin.format = format;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match cli.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    let formatter = create_formatter(config.admin.format, config.admin.color);
    formatter.print_config(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.general.threads)
        .thread_name("headcannon-worker")
        .enable_all()
        .build()?;

    runtime.block_on(run(config, formatter))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

async fn run(
    config: Config,
    formatter: Box<dyn OutputFormatter>,
) -> Result<(), Box<dyn std::error::Error>> {
    let _admin_handle = match config.admin.listen {
        Some(addr) => Some(AdminServer::new(addr).run()?),
        None => None,
    };

    let generator = LoadGenerator::from_config(&config)?;

    formatter.print_running(&generator.plan());
    formatter.print_header();

    let mut progress = Sampler::new();
    let mut ticker = tokio::time::interval(config.admin.sample_interval);
    // The first tick fires immediately.
    ticker.tick().await;

    let pending = generator.run();
    tokio::pin!(pending);

    let outcome = loop {
        tokio::select! {
            outcome = &mut pending => break outcome,
            _ = ticker.tick() => {
                formatter.print_sample(&progress.sample());
            }
        }
    };

    match outcome {
        Ok(result) => {
            let latencies = sampler::latency_stats(&metrics::RESPONSE_LATENCY);
            formatter.print_results(&Results::new(&result, latencies));
            Ok(())
        }
        Err(e) => {
            formatter.print_failure(&e);
            Err(e.into())
        }
    }
}
