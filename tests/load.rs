mod common;

use axum::http::{StatusCode, Version};
use common::{config_for, refused_addr, spawn_plain, spawn_tls};
use headcannon::client::FailureKind;
use headcannon::config::{ErrorPolicy, ThroughputBasis, TransportMode};
use headcannon::{LoadGenerator, RunError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_even_split_reaches_server() {
    let server = spawn_plain(StatusCode::OK).await;
    let config = config_for(&server.http_url(), TransportMode::Plain, 10, 100);

    let generator = LoadGenerator::from_config(&config).unwrap();
    assert_eq!(generator.plan().per_worker, 10);

    let result = generator.run().await.unwrap();
    assert_eq!(result.attempted, 100);
    assert_eq!(result.completed, 100);
    assert_eq!(result.failed, 0);
    assert!(result.elapsed.as_secs_f64() > 0.0);
    assert_eq!(server.seen.requests(), 100);
    assert_eq!(server.seen.heads(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_uneven_split_keeps_nominal_numerator() {
    let server = spawn_plain(StatusCode::OK).await;
    let config = config_for(&server.http_url(), TransportMode::Plain, 3, 10);

    let result = LoadGenerator::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(server.seen.requests(), 9);
    assert_eq!(result.attempted, 9);
    assert_eq!(result.basis, ThroughputBasis::Nominal);
    assert_eq!(result.throughput_numerator(), 10);
    assert_eq!(result.throughput, 10.0 / result.elapsed.as_secs_f64());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_completed_basis_counts_sent_requests() {
    let server = spawn_plain(StatusCode::OK).await;
    let mut config = config_for(&server.http_url(), TransportMode::Plain, 3, 10);
    config.workload.throughput_basis = ThroughputBasis::Completed;

    let result = LoadGenerator::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(result.throughput_numerator(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_error_status_is_not_a_failure() {
    let server = spawn_plain(StatusCode::SERVICE_UNAVAILABLE).await;
    let config = config_for(&server.http_url(), TransportMode::Plain, 2, 10);

    let result = LoadGenerator::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(result.completed, 10);
    assert_eq!(result.failed, 0);
    assert_eq!(result.error_responses, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refused_connection_is_fatal() {
    let url = format!("http://{}/", refused_addr());
    let config = config_for(&url, TransportMode::Plain, 4, 40);

    let err = LoadGenerator::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap_err();

    match err {
        RunError::Request {
            iteration, source, ..
        } => {
            assert_eq!(iteration, 0);
            assert_eq!(source.kind, FailureKind::Connect);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_refused_connection_skipped() {
    let url = format!("http://{}/", refused_addr());
    let mut config = config_for(&url, TransportMode::Plain, 4, 40);
    config.workload.on_error = ErrorPolicy::Skip;

    let result = LoadGenerator::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(result.attempted, 40);
    assert_eq!(result.completed, 0);
    assert_eq!(result.failed, 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_insecure_tls_accepts_self_signed() {
    let server = spawn_tls().await;
    let config = config_for(&server.https_url(), TransportMode::TlsInsecure, 4, 20);

    let result = LoadGenerator::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(result.completed, 20);
    assert_eq!(server.seen.heads(), 20);
    assert!(
        server
            .seen
            .versions()
            .iter()
            .all(|v| *v == Version::HTTP_11)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_verified_tls_rejects_self_signed() {
    let server = spawn_tls().await;
    let config = config_for(&server.https_url(), TransportMode::Tls, 2, 4);

    let result = LoadGenerator::from_config(&config).unwrap().run().await;

    assert!(matches!(result, Err(RunError::Request { .. })));
    assert_eq!(server.seen.requests(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_http2_insecure_negotiates_h2() {
    let server = spawn_tls().await;
    let config = config_for(&server.https_url(), TransportMode::Http2Insecure, 4, 20);

    let result = LoadGenerator::from_config(&config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(result.completed, 20);
    let versions = server.seen.versions();
    assert_eq!(versions.len(), 20);
    assert!(versions.iter().all(|v| *v == Version::HTTP_2));
}
