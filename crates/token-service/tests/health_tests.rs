//! Health and metrics endpoint integration tests.
//!
//! Tests `/health` and `/metrics` using the `TestTokenServer` harness.

use ts_test_utils::{TestTokenServer, TEST_SERVER_URL};

/// `/health` reports healthy and echoes the configured media server URL.
#[tokio::test]
async fn test_health_endpoint_returns_service_info() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "room-token-service");
    assert_eq!(body["serverUrl"], TEST_SERVER_URL);

    Ok(())
}

/// `/health` answers cross-origin callers.
#[tokio::test]
async fn test_health_endpoint_sets_cors_header() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.url()))
        .header("origin", "https://studio.example.com")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    Ok(())
}

/// `/metrics` serves Prometheus text.
#[tokio::test]
async fn test_metrics_endpoint_returns_200() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), 200);

    Ok(())
}

/// Unknown paths are 404.
#[tokio::test]
async fn test_unknown_path_returns_404() -> Result<(), anyhow::Error> {
    let server = TestTokenServer::spawn().await?;

    let response = reqwest::get(format!("{}/api/v1/rooms", server.url())).await?;

    assert_eq!(response.status(), 404);

    Ok(())
}
