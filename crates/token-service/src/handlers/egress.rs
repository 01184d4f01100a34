//! Recording and streaming endpoints.

use crate::errors::TsError;
use crate::handlers::{parse_body, record_failure};
use crate::models::{
    EgressStartedResponse, StartRecordingRequest, StartStreamingRequest, SuccessResponse,
};
use crate::routes::AppState;
use crate::services::egress_client::default_recording_path;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /room/:room/record/start
///
/// Starts an MP4 recording of the whole room. `outputPath` defaults to
/// `/recordings/{room}.mp4` when absent or blank.
#[instrument(skip_all, name = "ts.egress.record_start", fields(room = %room))]
pub async fn start_recording(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    body: Bytes,
) -> Result<Json<EgressStartedResponse>, TsError> {
    let request: StartRecordingRequest =
        parse_body(&body).map_err(|e| record_failure("start_recording", e))?;

    let output_path = request
        .output_path
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| default_recording_path(&room));

    let egress_id = state
        .egress_client
        .start_recording(&room, &output_path)
        .await
        .map_err(|e| record_failure("start_recording", e))?;

    Ok(Json(EgressStartedResponse {
        egress_id,
        status: "recording".to_string(),
    }))
}

/// Handler for POST /room/:room/stream/start
///
/// # Response
///
/// - 200 OK: `{egressId, status: "streaming"}`
/// - 400 Bad Request: `rtmpUrl` missing or blank (nothing is started)
/// - 500 Internal Server Error: media server error
#[instrument(skip_all, name = "ts.egress.stream_start", fields(room = %room))]
pub async fn start_streaming(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    body: Bytes,
) -> Result<Json<EgressStartedResponse>, TsError> {
    let request: StartStreamingRequest =
        parse_body(&body).map_err(|e| record_failure("start_streaming", e))?;

    // The URL is forwarded exactly as given; only blankness is checked.
    let rtmp_url = match request.rtmp_url {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            return Err(record_failure(
                "start_streaming",
                TsError::Validation("rtmp url required".to_string()),
            ))
        }
    };

    let egress_id = state
        .egress_client
        .start_streaming(&room, &rtmp_url)
        .await
        .map_err(|e| record_failure("start_streaming", e))?;

    Ok(Json(EgressStartedResponse {
        egress_id,
        status: "streaming".to_string(),
    }))
}

/// Handler for POST /egress/:egress_id/stop
#[instrument(skip_all, name = "ts.egress.stop", fields(egress_id = %egress_id))]
pub async fn stop_egress(
    State(state): State<Arc<AppState>>,
    Path(egress_id): Path<String>,
) -> Result<Json<SuccessResponse>, TsError> {
    state
        .egress_client
        .stop_egress(&egress_id)
        .await
        .map_err(|e| record_failure("stop_egress", e))?;

    Ok(Json(SuccessResponse::ok()))
}
