use crate::output::{ColorMode, OutputFormat};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub connection: Connection,
    #[serde(default)]
    pub workload: Workload,
    #[serde(default)]
    pub admin: Admin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    /// Number of concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Total number of HEAD requests, split evenly across workers.
    #[serde(default = "default_requests")]
    pub requests: u64,
    /// Runtime worker threads driving the workers.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for General {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            requests: default_requests(),
            threads: default_threads(),
        }
    }
}

fn default_workers() -> usize {
    100
}

fn default_requests() -> u64 {
    100_000
}

fn default_threads() -> usize {
    num_cpus()
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Target {
    /// Request URL. Defaults to the loopback address with the mode's scheme.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mode: TransportMode,
}

impl Target {
    /// The URL requests are sent to, after applying the mode's default.
    pub fn resolved_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| self.mode.default_url().to_string())
    }
}

/// Connection security and protocol used for every request.
///
/// The `*-insecure` modes skip server certificate verification and exist for
/// benchmarking against loopback servers with self-signed certificates.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    /// HTTP/1.1 over plain TCP.
    #[default]
    Plain,
    /// HTTP/1.1 over TLS without certificate verification.
    TlsInsecure,
    /// HTTP/2 (negotiated through ALPN) over TLS without certificate verification.
    Http2Insecure,
    /// HTTP/1.1 over TLS, verified against the Mozilla root store.
    Tls,
    /// HTTP/2 over TLS, verified against the Mozilla root store.
    Http2,
}

impl TransportMode {
    #[inline]
    pub fn is_tls(self) -> bool {
        !matches!(self, TransportMode::Plain)
    }

    #[inline]
    pub fn is_http2(self) -> bool {
        matches!(self, TransportMode::Http2 | TransportMode::Http2Insecure)
    }

    #[inline]
    pub fn verifies_certificates(self) -> bool {
        matches!(self, TransportMode::Tls | TransportMode::Http2)
    }

    pub fn scheme(self) -> &'static str {
        if self.is_tls() { "https" } else { "http" }
    }

    pub fn default_url(self) -> &'static str {
        if self.is_tls() {
            "https://127.0.0.1/"
        } else {
            "http://127.0.0.1/"
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Plain => "plain",
            TransportMode::TlsInsecure => "tls-insecure",
            TransportMode::Http2Insecure => "http2-insecure",
            TransportMode::Tls => "tls",
            TransportMode::Http2 => "http2",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(TransportMode::Plain),
            "tls-insecure" => Ok(TransportMode::TlsInsecure),
            "http2-insecure" => Ok(TransportMode::Http2Insecure),
            "tls" => Ok(TransportMode::Tls),
            "http2" => Ok(TransportMode::Http2),
            _ => Err(format!(
                "invalid mode '{}', expected: plain, tls-insecure, http2-insecure, tls, http2",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    /// Idle connections kept open per host in the shared pool.
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_max_idle_per_host(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_max_idle_per_host() -> usize {
    100
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workload {
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default)]
    pub throughput_basis: ThroughputBasis,
}

/// What a worker does when a request fails.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first failed request.
    #[default]
    Fatal,
    /// Count the failure and continue with the next iteration.
    Skip,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Fatal => f.write_str("fatal"),
            ErrorPolicy::Skip => f.write_str("skip"),
        }
    }
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fatal" => Ok(ErrorPolicy::Fatal),
            "skip" => Ok(ErrorPolicy::Skip),
            _ => Err(format!("invalid error policy '{}', expected: fatal, skip", s)),
        }
    }
}

/// Numerator used when computing throughput.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThroughputBasis {
    /// The configured request count, even when integer division or skipped
    /// failures mean fewer requests completed. Comparable with earlier runs.
    #[default]
    Nominal,
    /// The number of requests that completed.
    Completed,
}

impl fmt::Display for ThroughputBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThroughputBasis::Nominal => f.write_str("nominal"),
            ThroughputBasis::Completed => f.write_str("completed"),
        }
    }
}

/// Admin/reporting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Admin {
    /// Listen address for Prometheus metrics endpoint.
    #[serde(default)]
    pub listen: Option<SocketAddr>,
    /// Output format (clean, json, verbose, quiet).
    #[serde(default, with = "output_format_serde")]
    pub format: OutputFormat,
    /// Color mode (auto, always, never).
    #[serde(default, with = "color_mode_serde")]
    pub color: ColorMode,
    /// Interval between progress samples while the run is in flight.
    #[serde(default = "default_sample_interval", with = "humantime_serde")]
    pub sample_interval: Duration,
}

impl Default for Admin {
    fn default() -> Self {
        Self {
            listen: None,
            format: OutputFormat::default(),
            color: ColorMode::default(),
            sample_interval: default_sample_interval(),
        }
    }
}

fn default_sample_interval() -> Duration {
    Duration::from_secs(1)
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check the invariants the load generator relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.workers == 0 {
            return Err(ConfigError::Invalid("workers must be positive".to_string()));
        }
        if self.general.requests == 0 {
            return Err(ConfigError::Invalid("requests must be positive".to_string()));
        }
        if self.general.threads == 0 {
            return Err(ConfigError::Invalid("threads must be positive".to_string()));
        }
        if self.admin.sample_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "sample_interval must be non-zero".to_string(),
            ));
        }

        let url = self.target_url()?;
        let mode = self.target.mode;
        if url.scheme() != mode.scheme() {
            return Err(ConfigError::Invalid(format!(
                "mode '{}' requires an {} URL, got '{}'",
                mode,
                mode.scheme(),
                url
            )));
        }

        Ok(())
    }

    /// Parse the resolved target URL.
    pub fn target_url(&self) -> Result<Url, ConfigError> {
        let url = self.target.resolved_url();
        Url::parse(&url).map_err(|e| ConfigError::Invalid(format!("invalid url '{}': {}", url, e)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parse a duration like "60s", "10m", "250ms". A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let (num, suffix) = s.split_at(s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len()));

    let value: u64 = num.parse().map_err(|e| format!("invalid number: {e}"))?;

    let multiplier = match suffix.trim() {
        "s" | "sec" | "secs" => 1,
        "m" | "min" | "mins" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "ms" => return Ok(Duration::from_millis(value)),
        "us" => return Ok(Duration::from_micros(value)),
        "ns" => return Ok(Duration::from_nanos(value)),
        "" => 1,
        other => return Err(format!("unknown time unit: {other}")),
    };

    let secs = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration overflow: {s}"))?;
    Ok(Duration::from_secs(secs))
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

mod output_format_serde {
    use crate::output::OutputFormat;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OutputFormat, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

mod color_mode_serde {
    use crate::output::ColorMode;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ColorMode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
