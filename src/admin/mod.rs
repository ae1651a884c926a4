//! Prometheus text endpoint exposing the benchmark metrics during a run.

use std::fmt::Write as _;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Percentiles exported for each histogram.
const PERCENTILES: [f64; 6] = [50.0, 90.0, 95.0, 99.0, 99.9, 99.99];

/// Admin server that exposes Prometheus metrics on its own thread.
pub struct AdminServer {
    listen_addr: SocketAddr,
    stop_notify: Arc<Notify>,
}

impl AdminServer {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            stop_notify: Arc::new(Notify::new()),
        }
    }

    /// Spawn the server thread and return immediately.
    pub fn run(self) -> io::Result<AdminHandle> {
        let stop_notify = Arc::clone(&self.stop_notify);
        let addr = self.listen_addr;

        let handle = std::thread::Builder::new()
            .name("admin".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::error!("failed to create admin runtime: {}", e);
                        return;
                    }
                };

                rt.block_on(async move {
                    if let Err(e) = run_prometheus_server(addr, self.stop_notify).await {
                        tracing::error!("prometheus server error: {}", e);
                    }
                });
            })?;

        Ok(AdminHandle {
            handle: Some(handle),
            stop_notify,
        })
    }
}

pub struct AdminHandle {
    handle: Option<std::thread::JoinHandle<()>>,
    stop_notify: Arc<Notify>,
}

impl AdminHandle {
    pub fn shutdown(&mut self) {
        // notify_one stores a permit, so a server that is not yet waiting still stops.
        self.stop_notify.notify_one();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AdminHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_prometheus_server(addr: SocketAddr, stop_notify: Arc<Notify>) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("prometheus server listening on {}", addr);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((mut socket, _peer)) => {
                        tokio::spawn(async move {
                            let mut buf = [0u8; 1024];
                            // The request line is irrelevant: every path serves metrics.
                            let _ = socket.read(&mut buf).await;

                            let body = generate_prometheus_output();
                            let response = format!(
                                "HTTP/1.1 200 OK\r\n\
                                 Content-Type: text/plain; version=0.0.4\r\n\
                                 Content-Length: {}\r\n\
                                 Connection: close\r\n\
                                 \r\n\
                                 {}",
                                body.len(),
                                body
                            );

                            let _ = socket.write_all(response.as_bytes()).await;
                        });
                    }
                    Err(e) => {
                        tracing::debug!("accept error: {}", e);
                    }
                }
            }
            _ = stop_notify.notified() => {
                break;
            }
        }
    }

    Ok(())
}

/// Render every registered metric in the Prometheus text format.
pub fn generate_prometheus_output() -> String {
    let mut output = String::new();

    for metric in metriken::metrics().iter() {
        let name = metric.name();
        let Some(value) = metric.value() else {
            continue;
        };

        match value {
            metriken::Value::Counter(v) => {
                let _ = writeln!(output, "# TYPE {} counter", name);
                let _ = writeln!(output, "{} {}", name, v);
            }
            metriken::Value::Gauge(v) => {
                let _ = writeln!(output, "# TYPE {} gauge", name);
                let _ = writeln!(output, "{} {}", name, v);
            }
            metriken::Value::Other(any) => {
                let Some(snapshot) = any
                    .downcast_ref::<metriken::AtomicHistogram>()
                    .and_then(|h| h.load())
                else {
                    continue;
                };

                let _ = writeln!(output, "# TYPE {} summary", name);
                if let Ok(Some(results)) = snapshot.percentiles(&PERCENTILES) {
                    for (pct, bucket) in results {
                        let _ = writeln!(
                            output,
                            "{}{{quantile=\"{}\"}} {}",
                            name,
                            pct / 100.0,
                            bucket.end()
                        );
                    }
                }

                let mut count = 0u64;
                let mut sum = 0u64;
                for bucket in snapshot.into_iter() {
                    count += bucket.count();
                    // Bucket midpoint approximates the sum.
                    sum += bucket.count() * ((bucket.start() + bucket.end()) / 2);
                }
                let _ = writeln!(output, "{}_count {}", name, count);
                let _ = writeln!(output, "{}_sum {}", name, sum);
            }
            _ => {}
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    #[test]
    fn test_output_lists_registered_metrics() {
        metrics::REQUESTS_SENT.increment();
        let output = generate_prometheus_output();
        assert!(output.contains("# TYPE requests_sent counter"));
        assert!(output.contains("# TYPE workers_active gauge"));
    }

    #[tokio::test]
    async fn test_serves_metrics_over_http() {
        // Find a free port, then hand it to the server.
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = probe.local_addr().unwrap();
        drop(probe);

        let mut handle = AdminServer::new(addr).run().unwrap();

        let mut body = String::new();
        for _ in 0..50 {
            if let Ok(mut stream) = tokio::net::TcpStream::connect(addr).await {
                stream
                    .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\n\r\n")
                    .await
                    .unwrap();
                stream.read_to_string(&mut body).await.unwrap();
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        assert!(body.starts_with("HTTP/1.1 200 OK"));
        assert!(body.contains("requests_sent"));
        handle.shutdown();
    }
}
