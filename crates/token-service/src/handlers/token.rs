//! Participant token endpoint.

use crate::errors::TsError;
use crate::handlers::{parse_body, record_failure};
use crate::models::{TokenRequest, TokenResponse};
use crate::observability::metrics;
use crate::routes::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Handler for POST /token
///
/// Issues a host or guest token for `room`. Identities are generated, so
/// the same display name may be issued any number of tokens.
///
/// # Response
///
/// - 200 OK: `{token, identity, room, serverUrl}`
/// - 400 Bad Request: blank room or participant, malformed body
/// - 500 Internal Server Error: signing failed
#[instrument(
    skip_all,
    name = "ts.token.issue",
    fields(method = "POST", endpoint = "/token", is_host = tracing::field::Empty)
)]
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenResponse>, TsError> {
    let start = Instant::now();

    let request: TokenRequest =
        parse_body(&body).map_err(|e| record_failure("issue_token", e))?;

    let is_host = request.is_host();
    tracing::Span::current().record("is_host", is_host);

    let result = state.issuer.issue(
        request.room.as_deref().unwrap_or_default(),
        request.participant.as_deref().unwrap_or_default(),
        is_host,
    );

    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_token_issuance(is_host, status, start.elapsed());

    let issued = result.map_err(|e| record_failure("issue_token", e))?;

    Ok(Json(TokenResponse {
        token: issued.token,
        identity: issued.identity,
        room: issued.room,
        server_url: issued.server_url,
    }))
}
