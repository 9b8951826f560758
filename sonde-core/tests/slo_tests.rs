// Tests for the SLO baseline prober

use serde_json::Map;
use sonde_core::config::SloSettings;
use sonde_core::{DiscoveryEngine, SloProber, assign_weights};
use sonde_scanner::{Endpoint, Headers, HttpProbe};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn prober() -> SloProber {
    SloProber::new(HttpProbe::new(), SloSettings::default(), Duration::from_secs(5))
}

#[tokio::test]
async fn test_no_eligible_endpoints_yields_nulls() {
    let mock_server = MockServer::start().await;

    let mut endpoints = vec![
        Endpoint::rest("POST", "/orders"),
        Endpoint::rest("GET", "/health"),
        Endpoint::graphql("users", "query", "/graphql", String::new(), Map::new()),
    ];
    assign_weights(&mut endpoints);

    let baseline = prober()
        .probe(&mock_server.uri(), &endpoints, &Headers::new())
        .await;

    assert!(baseline.p95_ms.is_none());
    assert!(baseline.error_rate.is_none());
    assert!(baseline.apdex_score.is_none());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_404_counts_as_error_and_latency_sample() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let endpoints = vec![Endpoint::rest("GET", "/missing")];
    let baseline = prober()
        .probe(&mock_server.uri(), &endpoints, &Headers::new())
        .await;

    assert!(baseline.error_rate.unwrap() > 0.0);
    assert_eq!(baseline.error_rate, Some(1.0));
    assert!(baseline.p95_ms.is_some());
    assert_eq!(baseline.apdex_score, Some(1.0));
}

#[tokio::test]
async fn test_samples_first_n_get_endpoints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let endpoints: Vec<Endpoint> = (0..8)
        .map(|i| Endpoint::rest("GET", &format!("/r{}", i)))
        .collect();
    let baseline = prober()
        .with_sample(2)
        .probe(&format!("{}/", mock_server.uri()), &endpoints, &Headers::new())
        .await;

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
    assert!(requests.iter().all(|r| r.url.path() == "/r0" || r.url.path() == "/r1"));
    assert_eq!(baseline.error_rate, Some(0.0));
}

#[tokio::test]
async fn test_slow_responses_lower_apdex() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
        .mount(&mock_server)
        .await;

    let endpoints = vec![Endpoint::rest("GET", "/slow")];
    let baseline = prober()
        .probe(&mock_server.uri(), &endpoints, &Headers::new())
        .await;

    // every sample lands in the tolerating bucket
    assert_eq!(baseline.apdex_score, Some(0.5));
    assert!(baseline.p95_ms.unwrap() >= 600.0);
}

#[tokio::test]
async fn test_transport_failures_only_yield_nulls() {
    let endpoints = vec![Endpoint::rest("GET", "/x")];
    let baseline = SloProber::new(HttpProbe::new(), SloSettings::default(), Duration::from_secs(1))
        .probe("http://127.0.0.1:1", &endpoints, &Headers::new())
        .await;
    assert!(baseline.is_empty());
}

#[tokio::test]
async fn test_engine_baseline_uses_config_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = sonde_core::DiscoveryConfig::default();
    config.slo.attempts = 2;
    let engine = DiscoveryEngine::new(config);

    let endpoints = vec![Endpoint::rest("GET", "/items")];
    let baseline = engine
        .baseline_slo(&mock_server.uri(), &endpoints, &Headers::new())
        .await;
    assert_eq!(baseline.error_rate, Some(0.0));
}
