//! HTTP request handlers for the token service.

pub mod egress;
pub mod health;
pub mod metrics;
pub mod rooms;
pub mod token;

pub use egress::{start_recording, start_streaming, stop_egress};
pub use health::health_check;
pub use metrics::metrics_handler;
pub use rooms::{create_room, kick_participant, list_participants};
pub use token::issue_token;

use crate::errors::TsError;
use crate::observability::metrics::record_error;
use axum::body::Bytes;
use serde::de::DeserializeOwned;

/// Parse a JSON request body.
///
/// An empty body or a JSON `null` is treated as `{}` so that missing fields
/// surface as validation errors rather than parse errors. Malformed JSON is
/// a 400 (not axum's default 422).
pub(crate) fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, TsError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice::<Option<T>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| {
            tracing::debug!(target: "ts.handlers", error = %e, "Invalid request body");
            TsError::BadRequest("invalid request body".to_string())
        })
}

/// Count a handler failure in `ts_errors_total` and hand the error back.
pub(crate) fn record_failure(operation: &str, err: TsError) -> TsError {
    record_error(operation, err.error_type(), err.status_code());
    err
}
