// tests/applications_api_tests.rs
use app_health_aggregator::aggregator::ApplicationHealthAggregator;
use app_health_aggregator::api::ApplicationsApi;
use app_health_aggregator::config::{ApplicationConfig, HealthCheckSetting, ProbeConfig, Settings};
use app_health_aggregator::health::HttpProber;
use app_health_aggregator::server::RequestHandler;
use arc_swap::ArcSwap;
use hyper::{Body, Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn member(name: &str, uri: String) -> HealthCheckSetting {
    HealthCheckSetting {
        name: name.to_string(),
        uri,
    }
}

fn app(name: &str, members: &[&str]) -> ApplicationConfig {
    ApplicationConfig {
        name: name.to_string(),
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

fn handler(settings: Settings) -> RequestHandler {
    let prober = HttpProber::new(&ProbeConfig { timeout_ms: 1_000 }).unwrap();
    let aggregator = ApplicationHealthAggregator::new(Arc::new(prober), None);
    let api = ApplicationsApi::new(Arc::new(ArcSwap::from_pointee(settings)), aggregator);
    RequestHandler::new(Arc::new(api), "/api/health")
}

async fn get(handler: &RequestHandler, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    let response = handler.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Mocks stay registered only while their handles are alive.
async fn test_app_server() -> (mockito::ServerGuard, Vec<mockito::Mock>) {
    let mut server = mockito::Server::new_async().await;
    let healthy = server
        .mock("GET", "/service1/health")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"Healthy"}"#)
        .create_async()
        .await;
    let unhealthy = server
        .mock("GET", "/service2/health")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"Unhealthy"}"#)
        .create_async()
        .await;
    (server, vec![healthy, unhealthy])
}

#[tokio::test]
async fn test_get_application_aggregates_members() {
    let (server, _mocks) = test_app_server().await;
    let settings = Settings {
        health_checks: vec![
            member("Service1", format!("{}/service1/health", server.url())),
            member("Service2", format!("{}/service2/health", server.url())),
        ],
        applications: vec![app("TestApp", &["Service1", "Service2"])],
        ..Default::default()
    };

    let (status, body) = get(&handler(settings), "/api/health/applications/TestApp").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "TestApp");
    assert_eq!(body["status"], "Unhealthy");
    assert_eq!(body["healthyCount"], 1);
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["members"][0]["name"], "Service1");
    assert_eq!(body["members"][0]["status"], "Healthy");
    assert_eq!(body["members"][1]["name"], "Service2");
    assert_eq!(body["members"][1]["status"], "Unhealthy");
    assert!(body["checkedAt"].is_string());
    assert!(body["averageDurationMs"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_unknown_application_is_404() {
    let settings = Settings {
        applications: vec![app("TestApp", &[])],
        ..Default::default()
    };

    let (status, body) = get(&handler(settings), "/api/health/applications/Unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Application 'Unknown' not found");
}

#[tokio::test]
async fn test_get_application_with_encoded_name() {
    let (server, _mocks) = test_app_server().await;
    let settings = Settings {
        health_checks: vec![member("Service1", format!("{}/service1/health", server.url()))],
        applications: vec![app("Order Service", &["Service1"])],
        ..Default::default()
    };
    let handler = handler(settings);

    let (status, body) = get(&handler, "/api/health/applications/Order%20Service").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Order Service");
    assert_eq!(body["status"], "Healthy");

    let (status, body) = get(&handler, "/api/health/applications/Order%20Other").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Application 'Order Other' not found");
}

#[tokio::test]
async fn test_list_returns_every_application_in_order() {
    let (server, _mocks) = test_app_server().await;
    let settings = Settings {
        health_checks: vec![
            member("Service1", format!("{}/service1/health", server.url())),
            member("Down", "http://127.0.0.1:1/health".to_string()),
        ],
        applications: vec![
            app("Broken", &["Down"]),
            app("Fine", &["Service1"]),
            app("Empty", &[]),
        ],
        ..Default::default()
    };

    let (status, body) = get(&handler(settings), "/api/health/applications").await;

    assert_eq!(status, StatusCode::OK);
    let reports = body.as_array().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0]["name"], "Broken");
    assert_eq!(reports[0]["status"], "Unhealthy");
    assert_eq!(reports[0]["members"][0]["status"], "Unreachable");
    assert_eq!(reports[1]["name"], "Fine");
    assert_eq!(reports[1]["status"], "Healthy");
    assert_eq!(reports[2]["name"], "Empty");
    assert_eq!(reports[2]["status"], "Unknown");
    assert_eq!(reports[2]["totalCount"], 0);
}

#[tokio::test]
async fn test_routes_absent_without_applications() {
    let handler = handler(Settings::default());

    let (status, _) = get(&handler, "/api/health/applications").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&handler, "/api/health/applications/Any").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_paths_and_methods() {
    let handler = handler(Settings {
        applications: vec![app("TestApp", &[])],
        ..Default::default()
    });

    let (status, _) = get(&handler, "/api/healthz/applications").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&handler, "/api/health/applications/TestApp/extra").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/health/applications")
        .body(Body::empty())
        .unwrap();
    let response = handler.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
