//! Participant token issuance.
//!
//! Mints HS256 access tokens for the media server. Each token carries a
//! freshly generated participant identity, the display name, a host or
//! guest grant scoped to one room, and a fixed six hour lifetime.
//!
//! Tokens are not stored; there is no registry and no revocation.
//!
//! # Identity
//!
//! `lowercase(name)` with spaces replaced by underscores, then `_`, then 8
//! hex characters from 4 CSPRNG bytes. No uniqueness check is made against
//! participants already in the room, so two identities collide only if the
//! 32-bit suffixes do.

use crate::config::Config;
use crate::errors::TsError;
use chrono::Utc;
use common::jwt::{sign_access_token, AccessTokenClaims, VideoGrant};
use common::secret::SecretString;
use ring::rand::{SecureRandom, SystemRandom};
use std::time::Duration;
use tracing::{error, info};

/// Lifetime of participant tokens (6 hours).
pub const PARTICIPANT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Number of random bytes in the identity suffix (32 bits).
const IDENTITY_SUFFIX_BYTES: usize = 4;

/// A signed participant token and the values the client needs alongside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Signed JWT.
    pub token: String,

    /// Generated participant identity (`sub` claim).
    pub identity: String,

    /// Room the token grants access to.
    pub room: String,

    /// Media server URL the client should connect to.
    pub server_url: String,
}

/// Issues participant tokens and the short-lived service tokens used for
/// admin API calls.
#[derive(Clone)]
pub struct TokenIssuer {
    api_key: String,
    api_secret: SecretString,
    server_url: String,
}

impl TokenIssuer {
    /// Create an issuer for the given key pair and media server URL.
    pub fn new(api_key: String, api_secret: SecretString, server_url: String) -> Self {
        Self {
            api_key,
            api_secret,
            server_url,
        }
    }

    /// Create an issuer from service configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            config.server_url.clone(),
        )
    }

    /// API key tokens are issued under.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Issue a participant token valid from now.
    ///
    /// # Errors
    ///
    /// - `TsError::Validation` if `room` or `participant_name` is blank
    /// - `TsError::Internal` if the CSPRNG fails
    /// - `TsError::Upstream` if signing fails (e.g. empty secret)
    pub fn issue(
        &self,
        room: &str,
        participant_name: &str,
        is_host: bool,
    ) -> Result<IssuedToken, TsError> {
        self.issue_at(room, participant_name, is_host, Utc::now().timestamp())
    }

    /// Issue a participant token with an explicit issued-at timestamp.
    ///
    /// Prefer [`TokenIssuer::issue`]; this variant lets tests pin the clock.
    pub fn issue_at(
        &self,
        room: &str,
        participant_name: &str,
        is_host: bool,
        issued_at: i64,
    ) -> Result<IssuedToken, TsError> {
        let room = room.trim();
        if room.is_empty() {
            return Err(TsError::Validation("room required".to_string()));
        }

        let name = participant_name.trim();
        if name.is_empty() {
            return Err(TsError::Validation(
                "participant name required".to_string(),
            ));
        }

        let identity = participant_identity(name, &random_suffix()?);

        let grant = if is_host {
            VideoGrant::host(room)
        } else {
            VideoGrant::guest(room)
        };

        let claims = AccessTokenClaims::new(
            &self.api_key,
            &identity,
            name,
            grant,
            issued_at,
            PARTICIPANT_TOKEN_TTL,
        );

        let token = sign_access_token(&claims, &self.api_secret).map_err(|e| {
            error!(target: "ts.auth.issuer", error = %e, "Failed to sign participant token");
            TsError::from(e)
        })?;

        info!(
            target: "ts.auth.issuer",
            room = %room,
            participant = %name,
            is_host,
            "Token generated"
        );

        Ok(IssuedToken {
            token,
            identity,
            room: room.to_string(),
            server_url: self.server_url.clone(),
        })
    }

    /// Sign a service token carrying `grant`, valid for `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `TsError::Upstream` if signing fails.
    pub fn service_token(&self, grant: VideoGrant, ttl: Duration) -> Result<String, TsError> {
        let claims = AccessTokenClaims::new(
            &self.api_key,
            "",
            "",
            grant,
            Utc::now().timestamp(),
            ttl,
        );

        sign_access_token(&claims, &self.api_secret).map_err(|e| {
            error!(target: "ts.auth.issuer", error = %e, "Failed to sign service token");
            TsError::from(e)
        })
    }
}

/// Build a participant identity from a display name and a random suffix.
pub fn participant_identity(name: &str, suffix: &str) -> String {
    format!("{}_{}", name.to_lowercase().replace(' ', "_"), suffix)
}

/// Generate the identity suffix: 4 CSPRNG bytes as 8 lowercase hex chars.
fn random_suffix() -> Result<String, TsError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; IDENTITY_SUFFIX_BYTES];

    rng.fill(&mut bytes).map_err(|e| {
        error!(target: "ts.auth.issuer", error = %e, "Failed to generate random bytes for identity");
        TsError::Internal("RNG failure".to_string())
    })?;

    Ok(hex::encode(bytes))
}
