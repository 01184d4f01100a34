//! Media server admin API transport.
//!
//! The media server exposes its room and egress administration as Twirp
//! JSON RPC: `POST {base}/twirp/{package.Service}/{Method}` with a JSON
//! body and a bearer service token whose grant authorizes the call.
//!
//! # Security
//!
//! - Every call carries a freshly signed service token (10 minute lifetime)
//!   holding only the grant that method needs
//! - Timeouts prevent hanging connections; there are no retries
//! - The API secret never leaves the process; only signed tokens are sent

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::errors::TsError;
use crate::observability::metrics;
use common::jwt::VideoGrant;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// Lifetime of service tokens minted for admin calls.
pub const SERVICE_TOKEN_TTL: Duration = Duration::from_secs(10 * 60);

/// Connect timeout for admin API requests in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Rewrite the client-facing media server URL into the admin API base URL.
///
/// `ws://` becomes `http://` and `wss://` becomes `https://`; any other
/// scheme is left alone. A trailing slash is dropped so paths can be
/// appended directly.
pub fn admin_base_url(server_url: &str) -> String {
    let trimmed = server_url.trim_end_matches('/');

    if let Some(rest) = trimmed.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        trimmed.to_string()
    }
}

/// Twirp error body: `{"code": "not_found", "msg": "room not found"}`.
#[derive(Debug, Default, Deserialize)]
struct TwirpErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
}

/// Render a non-success admin API response as the message surfaced to
/// callers.
fn twirp_error_message(status: StatusCode, body: &str) -> String {
    let parsed: TwirpErrorBody = serde_json::from_str(body).unwrap_or_default();

    match (parsed.code.is_empty(), parsed.msg.is_empty()) {
        (false, false) => format!("{}: {}", parsed.code, parsed.msg),
        (true, false) => parsed.msg,
        (false, true) => parsed.code,
        (true, true) => format!("media server returned {status}"),
    }
}

/// HTTP client for the media server admin API.
#[derive(Clone)]
pub struct TwirpClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Admin API base URL (HTTP scheme).
    base_url: String,

    /// Signs the per-call service tokens.
    issuer: TokenIssuer,
}

impl TwirpClient {
    /// Create a client for the media server at `server_url`.
    ///
    /// # Arguments
    ///
    /// * `server_url` - Client-facing media server URL (ws/wss or http/https)
    /// * `issuer` - Token issuer holding the API key pair
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `TsError::Internal` if the HTTP client cannot be built.
    pub fn new(server_url: &str, issuer: TokenIssuer, timeout: Duration) -> Result<Self, TsError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                error!(target: "ts.services.twirp", error = %e, "Failed to build HTTP client");
                TsError::Internal("Failed to build HTTP client".to_string())
            })?;

        Ok(Self {
            client,
            base_url: admin_base_url(server_url),
            issuer,
        })
    }

    /// Create a client from service configuration.
    pub fn from_config(config: &Config, issuer: TokenIssuer) -> Result<Self, TsError> {
        Self::new(
            &config.server_url,
            issuer,
            Duration::from_secs(config.upstream_timeout_seconds),
        )
    }

    /// Admin API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invoke `service`/`method` with `request`, authorized by `grant`.
    ///
    /// # Errors
    ///
    /// Returns `TsError::Upstream` carrying the network error text, the
    /// Twirp error `code: msg`, or a response decoding failure.
    pub async fn call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        grant: VideoGrant,
        request: &Req,
    ) -> Result<Resp, TsError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        let token = self.issuer.service_token(grant, SERVICE_TOKEN_TTL)?;
        let url = format!("{}/twirp/{}/{}", self.base_url, service, method);

        let start = Instant::now();
        let result = self.send(&url, &token, request).await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_upstream_request(method, status, start.elapsed());

        result
    }

    async fn send<Req, Resp>(&self, url: &str, token: &str, request: &Req) -> Result<Resp, TsError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Send,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "ts.services.twirp", error = %e, url = %url, "Admin API request failed");
                TsError::Upstream(e.to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                error!(target: "ts.services.twirp", error = %e, "Failed to parse admin API response");
                TsError::Upstream(format!("invalid response from media server: {e}"))
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "ts.services.twirp", status = %status, body = %body, "Admin API returned error");
            Err(TsError::Upstream(twirp_error_message(status, &body)))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::jwt::decode_access_token;
    use common::secret::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "devkey".to_string(),
            SecretString::from("twirp-test-secret"),
            "ws://unused".to_string(),
        )
    }

    fn client_for(server: &MockServer) -> TwirpClient {
        TwirpClient::new(&server.uri(), issuer(), Duration::from_secs(5)).unwrap()
    }

    fn bearer(request: &Request) -> String {
        request
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap()
            .trim_start_matches("Bearer ")
            .to_string()
    }

    #[test]
    fn test_admin_base_url_rewrites_websocket_schemes() {
        assert_eq!(admin_base_url("ws://localhost:7880"), "http://localhost:7880");
        assert_eq!(
            admin_base_url("wss://media.example.com"),
            "https://media.example.com"
        );
    }

    #[test]
    fn test_admin_base_url_keeps_http_schemes() {
        assert_eq!(admin_base_url("http://localhost:7880"), "http://localhost:7880");
        assert_eq!(
            admin_base_url("https://media.example.com"),
            "https://media.example.com"
        );
    }

    #[test]
    fn test_admin_base_url_strips_trailing_slash() {
        assert_eq!(
            admin_base_url("wss://media.example.com/"),
            "https://media.example.com"
        );
    }

    #[test]
    fn test_twirp_error_message_formats() {
        assert_eq!(
            twirp_error_message(
                StatusCode::NOT_FOUND,
                r#"{"code":"not_found","msg":"room not found"}"#
            ),
            "not_found: room not found"
        );
        assert_eq!(
            twirp_error_message(StatusCode::BAD_REQUEST, r#"{"msg":"bad"}"#),
            "bad"
        );
        assert_eq!(
            twirp_error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "media server returned 502 Bad Gateway"
        );
    }

    #[tokio::test]
    async fn test_call_posts_json_with_scoped_service_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/twirp/livekit.RoomService/ListParticipants"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"room": "studio"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"participants": []})))
            .expect(1)
            .mount(&server)
            .await;

        let result: serde_json::Value = client_for(&server)
            .call(
                "livekit.RoomService",
                "ListParticipants",
                VideoGrant::room_admin("studio"),
                &json!({"room": "studio"}),
            )
            .await
            .unwrap();
        assert_eq!(result, json!({"participants": []}));

        let requests = server.received_requests().await.unwrap();
        let claims = decode_access_token(
            &bearer(requests.first().unwrap()),
            "devkey",
            &SecretString::from("twirp-test-secret"),
        )
        .unwrap();
        assert_eq!(claims.video, VideoGrant::room_admin("studio"));
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[tokio::test]
    async fn test_call_maps_twirp_error_to_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"code": "not_found", "msg": "room not found"})),
            )
            .mount(&server)
            .await;

        let result: Result<serde_json::Value, TsError> = client_for(&server)
            .call(
                "livekit.RoomService",
                "DeleteRoom",
                VideoGrant::room_create(),
                &json!({}),
            )
            .await;

        assert!(matches!(result, Err(TsError::Upstream(msg)) if msg == "not_found: room not found"));
    }

    #[tokio::test]
    async fn test_call_maps_unparseable_success_body_to_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result: Result<serde_json::Value, TsError> = client_for(&server)
            .call("livekit.Egress", "StopEgress", VideoGrant::room_record(), &json!({}))
            .await;

        assert!(
            matches!(result, Err(TsError::Upstream(msg)) if msg.starts_with("invalid response from media server"))
        );
    }

    #[tokio::test]
    async fn test_call_connection_refused_is_upstream() {
        let client = TwirpClient::new(
            "ws://127.0.0.1:1",
            issuer(),
            Duration::from_secs(2),
        )
        .unwrap();

        let result: Result<serde_json::Value, TsError> = client
            .call("livekit.Egress", "StopEgress", VideoGrant::room_record(), &json!({}))
            .await;

        assert!(matches!(result, Err(TsError::Upstream(_))));
    }
}
