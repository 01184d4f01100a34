//! Token service request and response models.
//!
//! JSON field names are camelCase on the wire. Request fields are all
//! optional at the serde level so that missing values reach the handlers
//! and produce the field-specific validation message.

use crate::services::room_client::ParticipantInfo;
use serde::{Deserialize, Serialize};

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "room-token-service";

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests.
    pub status: String,

    pub service: String,

    /// Media server URL clients connect to.
    pub server_url: String,
}

// ============================================================================
// Token API Models
// ============================================================================

/// Request body for `POST /token`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenRequest {
    pub room: Option<String>,

    /// Display name of the participant.
    pub participant: Option<String>,

    /// Grants the host template when true. Absent or `null` means guest.
    pub is_host: Option<bool>,
}

impl TokenRequest {
    pub fn is_host(&self) -> bool {
        self.is_host.unwrap_or(false)
    }
}

/// Response body for `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub identity: String,
    pub room: String,
    pub server_url: String,
}

// ============================================================================
// Room API Models
// ============================================================================

/// Request body for `POST /room/create`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRoomRequest {
    pub name: Option<String>,

    /// Seconds an empty room is kept (default: 300).
    pub empty_timeout: Option<u32>,

    /// Participant cap (default: 10).
    pub max_participants: Option<u32>,
}

/// Response body for `POST /room/create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub name: String,
    pub sid: String,
    pub created: bool,
}

/// Response body for `GET /room/{room}/participants`.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantsResponse {
    pub room: String,
    pub participants: Vec<ParticipantInfo>,
}

/// Response body for operations that report only success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ============================================================================
// Egress API Models
// ============================================================================

/// Request body for `POST /room/{room}/record/start`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartRecordingRequest {
    /// Output file path (default: `/recordings/{room}.mp4`).
    pub output_path: Option<String>,
}

/// Request body for `POST /room/{room}/stream/start`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartStreamingRequest {
    pub rtmp_url: Option<String>,
}

/// Response body for the egress start operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EgressStartedResponse {
    pub egress_id: String,

    /// "recording" or "streaming".
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_request_accepts_camel_case() {
        let request: TokenRequest = serde_json::from_value(json!({
            "room": "podcast_ABC123",
            "participant": "John Doe",
            "isHost": true
        }))
        .unwrap();

        assert_eq!(request.room.as_deref(), Some("podcast_ABC123"));
        assert_eq!(request.participant.as_deref(), Some("John Doe"));
        assert!(request.is_host());
    }

    #[test]
    fn test_token_request_is_host_defaults_false() {
        let request: TokenRequest =
            serde_json::from_value(json!({"room": "r", "participant": "p"})).unwrap();
        assert!(!request.is_host());
    }

    #[test]
    fn test_token_request_null_is_host_is_guest() {
        let request: TokenRequest = serde_json::from_value(json!({
            "room": "r",
            "participant": "p",
            "isHost": null
        }))
        .unwrap();
        assert_eq!(request.is_host, None);
        assert!(!request.is_host());
    }

    #[test]
    fn test_create_room_request_optional_fields() {
        let request: CreateRoomRequest =
            serde_json::from_value(json!({"name": "studio", "maxParticipants": 4})).unwrap();

        assert_eq!(request.name.as_deref(), Some("studio"));
        assert_eq!(request.empty_timeout, None);
        assert_eq!(request.max_participants, Some(4));
    }

    #[test]
    fn test_token_response_serializes_camel_case() {
        let response = TokenResponse {
            token: "jwt".to_string(),
            identity: "john_doe_0a1b2c3d".to_string(),
            room: "podcast_ABC123".to_string(),
            server_url: "ws://localhost:7880".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "token": "jwt",
                "identity": "john_doe_0a1b2c3d",
                "room": "podcast_ABC123",
                "serverUrl": "ws://localhost:7880"
            })
        );
    }

    #[test]
    fn test_egress_started_response_serializes_camel_case() {
        let response = EgressStartedResponse {
            egress_id: "EG_1".to_string(),
            status: "recording".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"egressId": "EG_1", "status": "recording"})
        );
    }
}
