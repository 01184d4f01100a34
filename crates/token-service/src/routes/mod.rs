//! HTTP routes for the token service.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenIssuer;
use crate::config::{Config, REQUEST_TIMEOUT_SECONDS};
use crate::errors::TsError;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::{
    EgressClient, EgressServiceTrait, RoomClient, RoomServiceTrait, TwirpClient,
};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Overall request timeout, covering the upstream call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(REQUEST_TIMEOUT_SECONDS);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Participant token issuer.
    pub issuer: TokenIssuer,

    /// Room administration on the media server.
    pub room_client: Arc<dyn RoomServiceTrait>,

    /// Recording and streaming on the media server.
    pub egress_client: Arc<dyn EgressServiceTrait>,
}

impl AppState {
    /// Build state with real admin API clients sharing one HTTP pool.
    ///
    /// # Errors
    ///
    /// Returns `TsError::Internal` if the HTTP client cannot be built.
    pub fn from_config(config: Config) -> Result<Self, TsError> {
        let issuer = TokenIssuer::from_config(&config);
        let twirp = TwirpClient::from_config(&config, issuer.clone())?;

        Ok(Self {
            room_client: Arc::new(RoomClient::new(twirp.clone())),
            egress_client: Arc::new(EgressClient::new(twirp)),
            issuer,
            config,
        })
    }
}

/// Build the application routes.
///
/// - `/health`, `/token`
/// - `/room/create`, `/room/:room/participants`, `/room/:room/kick/:identity`
/// - `/room/:room/record/start`, `/room/:room/stream/start`,
///   `/egress/:egress_id/stop`
/// - `/metrics` - Prometheus scrape endpoint
///
/// Browsers and mobile apps call the service directly, so CORS is
/// permissive.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/token", post(handlers::issue_token))
        .route("/room/create", post(handlers::create_room))
        .route(
            "/room/:room/participants",
            get(handlers::list_participants),
        )
        .route(
            "/room/:room/kick/:identity",
            post(handlers::kick_participant),
        )
        .route("/room/:room/record/start", post(handlers::start_recording))
        .route("/room/:room/stream/start", post(handlers::start_streaming))
        .route("/egress/:egress_id/stop", post(handlers::stop_egress))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. timeout_error_body - JSON body for the timeout's 408
    // 3. TraceLayer - Log request details
    // 4. CorsLayer - Answer preflights, add CORS headers
    // 5. http_metrics_middleware - Record ALL responses (outermost)
    api_routes
        .merge(metrics_routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::map_response(timeout_error_body))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// Replace the timeout layer's empty 408 with the usual `{"error"}` body.
///
/// No handler returns 408 itself.
async fn timeout_error_body(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return handlers::record_failure("request", TsError::Timeout).into_response();
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::services::egress_client::mock::MockEgressClient;
    use crate::services::room_client::mock::MockRoomClient;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn test_state(room: MockRoomClient, egress: MockEgressClient) -> Arc<AppState> {
        let config = Config::from_vars(&HashMap::new()).unwrap();
        Arc::new(AppState {
            issuer: TokenIssuer::from_config(&config),
            config,
            room_client: Arc::new(room),
            egress_client: Arc::new(egress),
        })
    }

    fn test_app() -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(
            test_state(MockRoomClient::accepting(), MockEgressClient::accepting()),
            handle,
        )
    }

    async fn call(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_app_state_from_config_builds_real_clients() {
        let config = Config::from_vars(&HashMap::new()).unwrap();
        let state = AppState::from_config(config).unwrap();
        assert_eq!(state.issuer.api_key(), "devkey");
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, body) = call(test_app(), "GET", "/health", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "room-token-service");
        assert_eq!(body["serverUrl"], "ws://localhost:7880");
    }

    #[tokio::test]
    async fn test_token_route_missing_room() {
        let (status, body) = call(test_app(), "POST", "/token", r#"{"participant":"a"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "room required");
    }

    #[tokio::test]
    async fn test_token_route_malformed_body_is_400() {
        let (status, body) = call(test_app(), "POST", "/token", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid request body");
    }

    #[tokio::test]
    async fn test_request_timeout_returns_json_error() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "late"
                }),
            )
            .layer(TimeoutLayer::new(Duration::from_millis(20)))
            .layer(middleware::map_response(timeout_error_body));

        let (status, body) = call(app, "GET", "/slow", "").await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], "request timed out");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = call(test_app(), "GET", "/rooms", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let (status, _) = call(test_app(), "GET", "/token", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/token")
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_metrics_route_renders_text() {
        let request = Request::builder()
            .method("GET")
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
