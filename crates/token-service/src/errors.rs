//! Token service error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl and are
//! returned to clients as `{"error": "<message>"}`.
//!
//! Validation messages name the missing field. Upstream messages carry the
//! media server's (or signer's) error text through to the caller; clients
//! of this service rely on seeing why a room or egress call failed.
//! Local internal failures are logged and answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Token service error type.
///
/// Maps to HTTP status codes:
/// - Validation, BadRequest: 400 Bad Request
/// - Upstream, Internal: 500 Internal Server Error
/// - Timeout: 408 Request Timeout
#[derive(Debug, Error)]
pub enum TsError {
    /// A required field is missing or blank.
    #[error("{0}")]
    Validation(String),

    /// The request body could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    /// The signer or the media server admin API failed.
    #[error("{0}")]
    Upstream(String),

    /// A local failure (RNG, HTTP client construction).
    #[error("Internal error: {0}")]
    Internal(String),

    /// The overall request deadline passed before a response was ready.
    #[error("request timed out")]
    Timeout,
}

impl TsError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            TsError::Validation(_) | TsError::BadRequest(_) => 400,
            TsError::Upstream(_) | TsError::Internal(_) => 500,
            TsError::Timeout => 408,
        }
    }

    /// Short label for the `error_type` metrics dimension.
    pub fn error_type(&self) -> &'static str {
        match self {
            TsError::Validation(_) => "validation",
            TsError::BadRequest(_) => "bad_request",
            TsError::Upstream(_) => "upstream",
            TsError::Internal(_) => "internal",
            TsError::Timeout => "timeout",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for TsError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TsError::Validation(msg) | TsError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            TsError::Upstream(msg) => {
                tracing::error!(target: "ts.upstream", error = %msg, "Upstream operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            TsError::Internal(msg) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "ts.internal", error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            TsError::Timeout => {
                tracing::warn!(target: "ts.handlers", "Request timed out");
                (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<common::jwt::JwtError> for TsError {
    fn from(err: common::jwt::JwtError) -> Self {
        TsError::Upstream(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use common::jwt::JwtError;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display_passes_message_through() {
        assert_eq!(
            TsError::Validation("room required".to_string()).to_string(),
            "room required"
        );
        assert_eq!(
            TsError::Upstream("not_found: room does not exist".to_string()).to_string(),
            "not_found: room does not exist"
        );
        assert_eq!(
            TsError::Internal("rng".to_string()).to_string(),
            "Internal error: rng"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(TsError::Validation("x".to_string()).status_code(), 400);
        assert_eq!(TsError::BadRequest("x".to_string()).status_code(), 400);
        assert_eq!(TsError::Upstream("x".to_string()).status_code(), 500);
        assert_eq!(TsError::Internal("x".to_string()).status_code(), 500);
        assert_eq!(TsError::Timeout.status_code(), 408);
    }

    #[test]
    fn test_jwt_error_becomes_upstream() {
        let err: TsError = JwtError::MissingSecret.into();
        assert!(matches!(err, TsError::Upstream(msg) if msg == "API secret is not configured"));
    }

    #[tokio::test]
    async fn test_into_response_validation() {
        let response = TsError::Validation("participant name required".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "participant name required");
    }

    #[tokio::test]
    async fn test_into_response_upstream_passes_message() {
        let response =
            TsError::Upstream("unavailable: egress not connected".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "unavailable: egress not connected");
    }

    #[tokio::test]
    async fn test_into_response_internal_is_generic() {
        let response = TsError::Internal("SystemRandom failed".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_into_response_timeout_has_json_body() {
        let response = TsError::Timeout.into_response();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"], "request timed out");
    }
}
