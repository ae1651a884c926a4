//! Mock HTTP servers used by the integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, Version};
use axum::routing::any;
use headcannon::config::{Config, TransportMode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// What the mock server has observed.
#[derive(Default)]
pub struct Seen {
    requests: AtomicU64,
    heads: AtomicU64,
    versions: Mutex<Vec<Version>>,
}

impl Seen {
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> u64 {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn versions(&self) -> Vec<Version> {
        self.versions.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct AppState {
    seen: Arc<Seen>,
    status: StatusCode,
}

async fn record(State(state): State<AppState>, request: Request) -> StatusCode {
    state.seen.requests.fetch_add(1, Ordering::SeqCst);
    if request.method() == Method::HEAD {
        state.seen.heads.fetch_add(1, Ordering::SeqCst);
    }
    state.seen.versions.lock().unwrap().push(request.version());
    state.status
}

fn router(seen: Arc<Seen>, status: StatusCode) -> Router {
    Router::new()
        .route("/", any(record))
        .route("/{*path}", any(record))
        .with_state(AppState { seen, status })
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub seen: Arc<Seen>,
}

impl MockServer {
    pub fn http_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn https_url(&self) -> String {
        format!("https://{}/", self.addr)
    }
}

/// Plain HTTP/1.1 server answering every request with `status`.
pub async fn spawn_plain(status: StatusCode) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Seen::default());

    let app = router(Arc::clone(&seen), status);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer { addr, seen }
}

/// TLS server with a self-signed certificate, offering `h2` and `http/1.1`.
pub async fn spawn_tls() -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Seen::default());

    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        certified.key_pair.serialize_der(),
    ));

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut server_config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![certified.cert.der().clone()], key)
        .unwrap();
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    let acceptor = TlsAcceptor::from(Arc::new(server_config));

    let app = router(Arc::clone(&seen), StatusCode::OK);
    tokio::spawn(async move {
        while let Ok((stream, _peer)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let app = app.clone();
            tokio::spawn(async move {
                // Verifying clients abort the handshake.
                let Ok(tls) = acceptor.accept(stream).await else {
                    return;
                };
                let _ = auto::Builder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(tls), TowerToHyperService::new(app))
                    .await;
            });
        }
    });

    MockServer { addr, seen }
}

/// An address nothing listens on.
pub fn refused_addr() -> SocketAddr {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap();
    drop(probe);
    addr
}

pub fn config_for(url: &str, mode: TransportMode, workers: usize, requests: u64) -> Config {
    let mut config = Config::default();
    config.general.workers = workers;
    config.general.requests = requests;
    config.target.url = Some(url.to_string());
    config.target.mode = mode;
    config.connection.connect_timeout = std::time::Duration::from_secs(2);
    config.connection.request_timeout = std::time::Duration::from_secs(5);
    config.validate().unwrap();
    config
}
