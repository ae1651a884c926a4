//! HTTP transport used by the workers.
//!
//! A single [`HttpTransport`] wraps one `reqwest::Client`, so every worker
//! borrows connections from the same pool. The [`Transport`] trait is the seam
//! the worker loop drives, which lets tests substitute scripted transports.

mod tls;

pub use tls::client_config;

use crate::config::{Config, Connection, TransportMode};

use reqwest::{Client, Url};
use std::error::Error as _;
use std::fmt;
use std::future::Future;

/// Outcome of one HEAD request whose body was fully drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadResponse {
    /// HTTP status code
    pub status: u16,
    /// Body bytes drained before the connection was released
    pub body_bytes: u64,
}

impl HeadResponse {
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Classification of a failed request, used for metrics and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection could not be established (refused, TLS handshake, DNS)
    Connect,
    /// Connect or request timeout elapsed
    Timeout,
    /// Response body could not be drained
    Body,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Connect => f.write_str("connect"),
            FailureKind::Timeout => f.write_str("timeout"),
            FailureKind::Body => f.write_str("body"),
            FailureKind::Other => f.write_str("other"),
        }
    }
}

/// A HEAD request that did not complete.
#[derive(Debug, Clone, thiserror::Error)]
#[error("HEAD {url} failed ({kind}): {message}")]
pub struct RequestFailure {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

impl RequestFailure {
    pub fn new(url: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            FailureKind::Timeout
        } else if error.is_connect() {
            FailureKind::Connect
        } else if error.is_body() || error.is_decode() {
            FailureKind::Body
        } else {
            FailureKind::Other
        };

        // reqwest's top-level message is generic; the cause is in the chain.
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::new(url.as_str(), kind, message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build tls config: {0}")]
    Tls(String),
    #[error("failed to build http client: {0}")]
    Build(String),
    #[error("invalid target url: {0}")]
    Url(String),
}

/// Issues HEAD requests against a fixed target.
///
/// Implementations must be safe to share across all workers of a run.
pub trait Transport: Send + Sync + 'static {
    /// Issue one HEAD request and drain its body.
    fn head(&self) -> impl Future<Output = Result<HeadResponse, RequestFailure>> + Send;
}

/// Production transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
    mode: TransportMode,
}

impl HttpTransport {
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let url = config
            .target_url()
            .map_err(|e| ClientError::Url(e.to_string()))?;
        Self::new(url, config.target.mode, &config.connection)
    }

    pub fn new(url: Url, mode: TransportMode, connection: &Connection) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(connection.max_idle_per_host)
            .connect_timeout(connection.connect_timeout)
            .timeout(connection.request_timeout)
            .tcp_nodelay(true);

        if !mode.is_http2() {
            builder = builder.http1_only();
        }

        if mode.is_tls() {
            if !mode.verifies_certificates() {
                tracing::warn!(
                    "{} mode: server certificates are NOT verified, use only against trusted benchmark targets",
                    mode
                );
            }
            builder = builder.use_preconfigured_tls(client_config(mode)?);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        tracing::debug!(
            %url,
            %mode,
            max_idle_per_host = connection.max_idle_per_host,
            "http transport ready"
        );

        Ok(Self { client, url, mode })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }
}

impl Transport for HttpTransport {
    async fn head(&self) -> Result<HeadResponse, RequestFailure> {
        let response = self
            .client
            .head(self.url.clone())
            .send()
            .await
            .map_err(|e| RequestFailure::from_reqwest(&self.url, e))?;

        let status = response.status().as_u16();

        // Drain the body so the connection goes back to the pool.
        let body = response
            .bytes()
            .await
            .map_err(|e| RequestFailure::from_reqwest(&self.url, e))?;

        Ok(HeadResponse {
            status,
            body_bytes: body.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_response_success() {
        let ok = HeadResponse {
            status: 204,
            body_bytes: 0,
        };
        assert!(ok.is_success());

        let redirect = HeadResponse {
            status: 301,
            body_bytes: 0,
        };
        assert!(!redirect.is_success());

        let server_error = HeadResponse {
            status: 503,
            body_bytes: 0,
        };
        assert!(!server_error.is_success());
    }

    #[test]
    fn test_request_failure_display() {
        let failure = RequestFailure::new(
            "http://127.0.0.1:1/",
            FailureKind::Connect,
            "connection refused",
        );
        assert_eq!(
            failure.to_string(),
            "HEAD http://127.0.0.1:1/ failed (connect): connection refused"
        );
    }

    #[test]
    fn test_build_for_every_mode() {
        let connection = Connection::default();
        for mode in [
            TransportMode::Plain,
            TransportMode::TlsInsecure,
            TransportMode::Http2Insecure,
            TransportMode::Tls,
            TransportMode::Http2,
        ] {
            let url = Url::parse(mode.default_url()).unwrap();
            let transport = HttpTransport::new(url, mode, &connection).unwrap();
            assert_eq!(transport.mode(), mode);
            assert_eq!(transport.url().scheme(), mode.scheme());
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_failure() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let transport = HttpTransport::new(url, TransportMode::Plain, &Connection::default())
            .unwrap();

        let failure = transport.head().await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Connect);
        assert!(failure.url.contains(&port.to_string()));
    }
}
