//! Room administration endpoints.
//!
//! Thin pass-through to the media server: validate, delegate, reshape the
//! result. These endpoints are unauthenticated; deploy them behind a
//! trusted network boundary.

use crate::errors::TsError;
use crate::handlers::{parse_body, record_failure};
use crate::models::{CreateRoomRequest, CreateRoomResponse, ParticipantsResponse, SuccessResponse};
use crate::routes::AppState;
use crate::services::room_client::{
    CreateRoomOptions, DEFAULT_EMPTY_TIMEOUT_SECS, DEFAULT_MAX_PARTICIPANTS,
};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /room/create
///
/// # Response
///
/// - 200 OK: `{name, sid, created: true}`
/// - 400 Bad Request: blank name, malformed body
/// - 500 Internal Server Error: media server error (message passed through)
#[instrument(skip_all, name = "ts.room.create", fields(method = "POST", endpoint = "/room/create"))]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreateRoomResponse>, TsError> {
    let request: CreateRoomRequest =
        parse_body(&body).map_err(|e| record_failure("create_room", e))?;

    let name = request.name.as_deref().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(record_failure(
            "create_room",
            TsError::Validation("room name required".to_string()),
        ));
    }

    let options = CreateRoomOptions {
        name: name.to_string(),
        empty_timeout: request.empty_timeout.unwrap_or(DEFAULT_EMPTY_TIMEOUT_SECS),
        max_participants: request.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
    };

    let room = state
        .room_client
        .create_room(&options)
        .await
        .map_err(|e| record_failure("create_room", e))?;

    Ok(Json(CreateRoomResponse {
        name: room.name,
        sid: room.sid,
        created: true,
    }))
}

/// Handler for GET /room/:room/participants
#[instrument(skip_all, name = "ts.room.participants", fields(room = %room))]
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<ParticipantsResponse>, TsError> {
    let participants = state
        .room_client
        .list_participants(&room)
        .await
        .map_err(|e| record_failure("list_participants", e))?;

    Ok(Json(ParticipantsResponse { room, participants }))
}

/// Handler for POST /room/:room/kick/:identity
///
/// Removing an identity that is not in the room is reported by the media
/// server and surfaces as a 500 with its message.
#[instrument(skip_all, name = "ts.room.kick", fields(room = %room, identity = %identity))]
pub async fn kick_participant(
    State(state): State<Arc<AppState>>,
    Path((room, identity)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, TsError> {
    state
        .room_client
        .remove_participant(&room, &identity)
        .await
        .map_err(|e| record_failure("kick_participant", e))?;

    Ok(Json(SuccessResponse::ok()))
}
