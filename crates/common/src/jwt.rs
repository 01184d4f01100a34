//! Access token claims and signing for the media server.
//!
//! The media server accepts HS256 JWTs signed with a shared API secret. The
//! token carries the participant identity in `sub`, the API key in `iss`,
//! and a room-scoped [`VideoGrant`] in the `video` claim.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing when decoding
//! - Only HS256 is accepted on decode
//! - An empty signing secret is rejected instead of producing a token
//!   anyone could forge
//! - The display name is redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{sign_access_token, AccessTokenClaims, VideoGrant};
//!
//! let claims = AccessTokenClaims::new("devkey", "alice_1a2b3c4d", "Alice",
//!     VideoGrant::guest("podcast_ABC123"), now, ttl);
//! let token = sign_access_token(&claims, &api_secret)?;
//! ```

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted JWT size in bytes (8KB).
///
/// Decoding rejects anything larger before base64 or HMAC work happens.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from signing or decoding access tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// The HS256 secret is empty.
    #[error("API secret is not configured")]
    MissingSecret,

    /// The JWT library refused to sign the claims.
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Token exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is structurally invalid or its signature does not verify.
    #[error("The access token is invalid or expired")]
    InvalidToken,

    /// Token `exp` is in the past.
    #[error("The access token is invalid or expired")]
    Expired,

    /// Token `iss` does not match the expected API key.
    #[error("The access token is invalid or expired")]
    WrongIssuer,
}

// =============================================================================
// Grant
// =============================================================================

/// Room-scoped capabilities embedded in an access token.
///
/// Serialized with the media server's camelCase claim names. `room` is
/// omitted when empty, which is how service grants that are not tied to a
/// single room (room creation, egress) are expressed.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoGrant {
    /// Room the grant is scoped to.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub room: String,

    /// May join the room.
    pub room_join: bool,

    /// May create rooms.
    pub room_create: bool,

    /// May list rooms.
    pub room_list: bool,

    /// May start and stop egress.
    pub room_record: bool,

    /// May administer the room (list, evict, mute participants).
    pub room_admin: bool,

    /// May publish tracks.
    pub can_publish: bool,

    /// May publish data messages.
    pub can_publish_data: bool,

    /// May subscribe to other participants' tracks.
    pub can_subscribe: bool,

    /// May update its own name and metadata.
    pub can_update_own_metadata: bool,
}

impl VideoGrant {
    /// Grant for a room host: every participant capability.
    #[must_use]
    pub fn host(room: &str) -> Self {
        Self {
            room: room.to_string(),
            room_join: true,
            room_create: true,
            room_admin: true,
            can_publish: true,
            can_publish_data: true,
            can_subscribe: true,
            can_update_own_metadata: true,
            ..Self::default()
        }
    }

    /// Grant for a guest: join and media capabilities, no create or admin.
    #[must_use]
    pub fn guest(room: &str) -> Self {
        Self {
            room: room.to_string(),
            room_join: true,
            can_publish: true,
            can_publish_data: true,
            can_subscribe: true,
            can_update_own_metadata: true,
            ..Self::default()
        }
    }

    /// Service grant for `CreateRoom`.
    #[must_use]
    pub fn room_create() -> Self {
        Self {
            room_create: true,
            ..Self::default()
        }
    }

    /// Service grant for participant administration in one room.
    #[must_use]
    pub fn room_admin(room: &str) -> Self {
        Self {
            room: room.to_string(),
            room_admin: true,
            ..Self::default()
        }
    }

    /// Service grant for egress control.
    #[must_use]
    pub fn room_record() -> Self {
        Self {
            room_record: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Claims of a media server access token.
///
/// The `name` field carries a user-supplied display name and is redacted in
/// Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer: the API key the token was signed for.
    pub iss: String,

    /// Subject: the participant identity. Empty for service tokens.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,

    /// Display name shown to other participants.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Not-before timestamp (Unix epoch seconds).
    pub nbf: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Room capabilities.
    pub video: VideoGrant,
}

impl fmt::Debug for AccessTokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenClaims")
            .field("iss", &self.iss)
            .field("sub", &self.sub)
            .field("name", &"[REDACTED]")
            .field("nbf", &self.nbf)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("video", &self.video)
            .finish()
    }
}

impl AccessTokenClaims {
    /// Build claims valid from `issued_at` for `ttl`.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Key the token is issued under (`iss`)
    /// * `identity` - Participant identity (`sub`), empty for service tokens
    /// * `name` - Display name, empty for service tokens
    /// * `video` - Room capabilities
    /// * `issued_at` - Unix epoch seconds used for `iat` and `nbf`
    /// * `ttl` - Lifetime; `exp = issued_at + ttl`
    #[must_use]
    pub fn new(
        api_key: &str,
        identity: &str,
        name: &str,
        video: VideoGrant,
        issued_at: i64,
        ttl: Duration,
    ) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            iss: api_key.to_string(),
            sub: identity.to_string(),
            name: name.to_string(),
            nbf: issued_at,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
            video,
        }
    }

    /// Token lifetime in seconds (`exp - iat`).
    #[must_use]
    pub fn lifetime_secs(&self) -> i64 {
        self.exp - self.iat
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Sign claims as an HS256 JWT.
///
/// # Errors
///
/// - `JwtError::MissingSecret` if the secret is empty
/// - `JwtError::Signing` if encoding fails
pub fn sign_access_token(
    claims: &AccessTokenClaims,
    api_secret: &SecretString,
) -> Result<String, JwtError> {
    let secret = api_secret.expose_secret();
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::Signing(e.to_string()))
}

/// Verify an HS256 access token and return its claims.
///
/// Checks size, signature, `exp`, `nbf`, and that `iss` equals `api_key`.
///
/// # Errors
///
/// Returns a `JwtError` variant describing the rejection. All decode
/// failures share one generic display message.
pub fn decode_access_token(
    token: &str,
    api_key: &str,
    api_secret: &SecretString,
) -> Result<AccessTokenClaims, JwtError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtError::TokenTooLarge);
    }

    let secret = api_secret.expose_secret();
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;
    validation.set_issuer(&[api_key]);

    decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Token rejected");
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer => JwtError::WrongIssuer,
            _ => JwtError::InvalidToken,
        }
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SIX_HOURS: Duration = Duration::from_secs(6 * 60 * 60);

    fn secret() -> SecretString {
        SecretString::from("test-secret-of-reasonable-length")
    }

    fn now() -> i64 {
        i64::try_from(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        )
        .unwrap()
    }

    fn guest_claims(issued_at: i64) -> AccessTokenClaims {
        AccessTokenClaims::new(
            "devkey",
            "alice_0a1b2c3d",
            "Alice",
            VideoGrant::guest("studio"),
            issued_at,
            SIX_HOURS,
        )
    }

    // -------------------------------------------------------------------------
    // Grant templates
    // -------------------------------------------------------------------------

    #[test]
    fn test_host_grant_has_every_participant_capability() {
        let grant = VideoGrant::host("studio");

        assert_eq!(grant.room, "studio");
        assert!(grant.room_join);
        assert!(grant.room_create);
        assert!(grant.room_admin);
        assert!(grant.can_publish);
        assert!(grant.can_publish_data);
        assert!(grant.can_subscribe);
        assert!(grant.can_update_own_metadata);
        assert!(!grant.room_list);
        assert!(!grant.room_record);
    }

    #[test]
    fn test_guest_grant_lacks_create_and_admin() {
        let grant = VideoGrant::guest("studio");

        assert_eq!(grant.room, "studio");
        assert!(grant.room_join);
        assert!(!grant.room_create);
        assert!(!grant.room_admin);
        assert!(grant.can_publish);
        assert!(grant.can_publish_data);
        assert!(grant.can_subscribe);
        assert!(grant.can_update_own_metadata);
    }

    #[test]
    fn test_service_grants() {
        assert!(VideoGrant::room_create().room_create);
        assert!(VideoGrant::room_create().room.is_empty());

        let admin = VideoGrant::room_admin("studio");
        assert!(admin.room_admin);
        assert!(!admin.room_join);
        assert_eq!(admin.room, "studio");

        assert!(VideoGrant::room_record().room_record);
    }

    #[test]
    fn test_grant_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(VideoGrant::host("studio")).unwrap();

        assert_eq!(json["room"], "studio");
        assert_eq!(json["roomJoin"], true);
        assert_eq!(json["roomCreate"], true);
        assert_eq!(json["roomAdmin"], true);
        assert_eq!(json["canPublish"], true);
        assert_eq!(json["canPublishData"], true);
        assert_eq!(json["canSubscribe"], true);
        assert_eq!(json["canUpdateOwnMetadata"], true);
    }

    #[test]
    fn test_grant_without_room_omits_room_key() {
        let json = serde_json::to_string(&VideoGrant::room_record()).unwrap();
        assert!(!json.contains("\"room\""));
        assert!(json.contains("\"roomRecord\":true"));
    }

    #[test]
    fn test_grant_deserializes_missing_fields_as_false() {
        let grant: VideoGrant = serde_json::from_str(r#"{"roomJoin":true}"#).unwrap();
        assert!(grant.room_join);
        assert!(!grant.room_admin);
        assert!(grant.room.is_empty());
    }

    // -------------------------------------------------------------------------
    // Claims
    // -------------------------------------------------------------------------

    #[test]
    fn test_claims_lifetime_is_exact() {
        let claims = guest_claims(1_700_000_000);

        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.nbf, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_000 + 21_600);
        assert_eq!(claims.lifetime_secs(), 21_600);
    }

    #[test]
    fn test_claims_debug_redacts_name() {
        let debug = format!("{:?}", guest_claims(0));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("Alice"));
        assert!(debug.contains("alice_0a1b2c3d"));
    }

    #[test]
    fn test_service_claims_omit_sub_and_name() {
        let claims = AccessTokenClaims::new(
            "devkey",
            "",
            "",
            VideoGrant::room_create(),
            0,
            Duration::from_secs(600),
        );
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("\"sub\""));
        assert!(!json.contains("\"name\""));
        assert!(json.contains("\"iss\":\"devkey\""));
    }

    // -------------------------------------------------------------------------
    // Signing and decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_sign_then_decode_returns_same_claims() {
        let claims = guest_claims(now());
        let token = sign_access_token(&claims, &secret()).unwrap();

        let decoded = decode_access_token(&token, "devkey", &secret()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_signed_header_is_hs256_jwt() {
        let token = sign_access_token(&guest_claims(now()), &secret()).unwrap();
        let header_b64 = token.split('.').next().unwrap();
        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64).unwrap()).unwrap();

        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");
    }

    #[test]
    fn test_sign_rejects_empty_secret() {
        let result = sign_access_token(&guest_claims(now()), &SecretString::from(""));
        assert_eq!(result, Err(JwtError::MissingSecret));
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let token = sign_access_token(&guest_claims(now()), &secret()).unwrap();
        let result = decode_access_token(&token, "devkey", &SecretString::from("other"));
        assert_eq!(result, Err(JwtError::InvalidToken));
    }

    #[test]
    fn test_decode_rejects_wrong_issuer() {
        let token = sign_access_token(&guest_claims(now()), &secret()).unwrap();
        let result = decode_access_token(&token, "otherkey", &secret());
        assert_eq!(result, Err(JwtError::WrongIssuer));
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        let claims = guest_claims(now() - 7 * 60 * 60);
        let token = sign_access_token(&claims, &secret()).unwrap();
        let result = decode_access_token(&token, "devkey", &secret());
        assert_eq!(result, Err(JwtError::Expired));
    }

    #[test]
    fn test_decode_rejects_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        let result = decode_access_token(&oversized, "devkey", &secret());
        assert_eq!(result, Err(JwtError::TokenTooLarge));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_access_token("not-a-jwt", "devkey", &secret());
        assert_eq!(result, Err(JwtError::InvalidToken));
    }

    #[test]
    fn test_decode_errors_share_generic_message() {
        assert_eq!(
            JwtError::Expired.to_string(),
            JwtError::InvalidToken.to_string()
        );
        assert_eq!(
            JwtError::WrongIssuer.to_string(),
            JwtError::TokenTooLarge.to_string()
        );
    }
}
