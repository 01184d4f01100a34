//! Test server harness for E2E testing
//!
//! Provides `TestTokenServer` for spawning real token service instances in
//! tests, either with mock admin clients or with real clients pointed at a
//! stand-in media server (e.g. a `wiremock::MockServer`).

use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use token_service::auth::TokenIssuer;
use token_service::config::Config;
use token_service::routes::{self, AppState};
use token_service::services::egress_client::mock::MockEgressClient;
use token_service::services::room_client::mock::MockRoomClient;
use tokio::task::JoinHandle;

/// API key the harness configures.
pub const TEST_API_KEY: &str = "APItest";

/// API secret the harness configures.
pub const TEST_API_SECRET: &str = "ts-test-secret-0123456789";

/// Media server URL the harness configures when no stand-in is given.
pub const TEST_SERVER_URL: &str = "wss://media.test.example";

/// Test harness for spawning the token service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let rooms = Arc::new(MockRoomClient::failing("not_found: room not found"));
/// let server = TestTokenServer::spawn_with(rooms.clone(), Arc::new(MockEgressClient::accepting())).await?;
///
/// let response = reqwest::get(format!("{}/room/x/participants", server.url())).await?;
/// assert_eq!(response.status(), 500);
/// assert_eq!(rooms.call_count(), 1);
/// ```
pub struct TestTokenServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestTokenServer {
    /// Spawn a server whose admin clients are accepting mocks.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(
            Arc::new(MockRoomClient::accepting()),
            Arc::new(MockEgressClient::accepting()),
        )
        .await
    }

    /// Spawn a server using the given mock admin clients.
    ///
    /// Keep a clone of the `Arc`s to inspect calls afterwards.
    pub async fn spawn_with(
        room_client: Arc<MockRoomClient>,
        egress_client: Arc<MockEgressClient>,
    ) -> Result<Self, anyhow::Error> {
        let config = test_config(TEST_SERVER_URL)?;

        let state = AppState {
            issuer: TokenIssuer::from_config(&config),
            config: config.clone(),
            room_client,
            egress_client,
        };

        Self::serve(state, config).await
    }

    /// Spawn a server with real admin clients talking to `media_server_url`.
    pub async fn spawn_against(media_server_url: &str) -> Result<Self, anyhow::Error> {
        let config = test_config(media_server_url)?;

        let state = AppState::from_config(config.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build state: {}", e))?;

        Self::serve(state, config).await
    }

    async fn serve(state: AppState, config: Config) -> Result<Self, anyhow::Error> {
        // A private recorder: the global one can only be installed once per process
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(Arc::new(state), metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestTokenServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

fn test_config(server_url: &str) -> Result<Config, anyhow::Error> {
    let vars = HashMap::from([
        ("LIVEKIT_API_KEY".to_string(), TEST_API_KEY.to_string()),
        ("LIVEKIT_API_SECRET".to_string(), TEST_API_SECRET.to_string()),
        ("LIVEKIT_URL".to_string(), server_url.to_string()),
        ("HOST".to_string(), "127.0.0.1".to_string()),
        ("UPSTREAM_TIMEOUT_SECONDS".to_string(), "5".to_string()),
    ]);

    Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))
}
