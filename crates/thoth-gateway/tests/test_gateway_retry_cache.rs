//! Exercises retry, caching, and circuit-breaker behavior against a mock
//! HTTP server instead of a live research API.

use std::time::Duration;

use thoth_gateway::{Gateway, RetryPolicy, ServiceConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn gateway_for(server: &MockServer) -> Gateway {
    Gateway::builder()
        .service(
            "mock",
            ServiceConfig { base_url: server.uri(), cache_ttl: Duration::from_secs(60) },
        )
        .retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
        })
        .circuit_breaker(2, Duration::from_millis(200))
        .build()
        .expect("gateway should build against a local sandbox allowlist")
}

#[tokio::test]
async fn successful_get_is_cached_and_not_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works/10.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"title": "hi"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut gateway = gateway_for(&server).await;
    gateway.register_service(
        "mock",
        ServiceConfig { base_url: server.uri(), cache_ttl: Duration::from_secs(60) },
    );

    let first = gateway.get("mock", "/works/10.1", &[]).await.unwrap();
    let second = gateway.get("mock", "/works/10.1", &[]).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn transient_5xx_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let result = gateway.get("mock", "/flaky", &[]).await.unwrap();
    assert_eq!(result, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn non_429_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let err = gateway.get("mock", "/missing", &[]).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn unknown_service_fails_fast_without_any_request() {
    let server = MockServer::start().await;
    let gateway = gateway_for(&server).await;
    let err = gateway.get("not-registered", "/x", &[]).await.unwrap_err();
    assert!(err.to_string().contains("not-registered") || err.to_string().contains("unknown"));
}

#[tokio::test]
async fn circuit_opens_after_repeated_failures_and_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server).await;
    let _ = gateway.get("mock", "/down", &[]).await;
    let _ = gateway.get("mock", "/down", &[]).await;

    let err = gateway.get("mock", "/down", &[]).await.unwrap_err();
    assert!(err.to_string().contains("circuit"));
}
