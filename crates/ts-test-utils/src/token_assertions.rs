//! Token assertion helpers.
//!
//! Decode tokens issued by a `TestTokenServer` and make fluent assertions
//! on their claims.

use crate::server_harness::{TEST_API_KEY, TEST_API_SECRET};
use common::jwt::{decode_access_token, AccessTokenClaims, VideoGrant};
use common::secret::SecretString;

/// Participant token lifetime in seconds (6 hours).
pub const PARTICIPANT_TOKEN_LIFETIME_SECS: i64 = 6 * 60 * 60;

/// Decode and verify a token signed with the harness key pair.
///
/// # Panics
///
/// Panics if the signature, issuer or expiry does not verify.
pub fn decode_test_token(token: &str) -> AccessTokenClaims {
    decode_access_token(token, TEST_API_KEY, &SecretString::from(TEST_API_SECRET))
        .unwrap_or_else(|e| panic!("token should verify with the test key pair: {e}"))
}

/// Fluent assertions on decoded claims.
pub trait TokenAssertions {
    /// Assert the token carries the host grant for `room`.
    fn assert_host_for(&self, room: &str) -> &Self;

    /// Assert the token carries the guest grant for `room`.
    fn assert_guest_for(&self, room: &str) -> &Self;

    /// Assert the identity is `prefix` followed by 8 lowercase hex chars.
    fn assert_identity_prefix(&self, prefix: &str) -> &Self;

    /// Assert the six hour participant lifetime.
    fn assert_participant_lifetime(&self) -> &Self;
}

impl TokenAssertions for AccessTokenClaims {
    fn assert_host_for(&self, room: &str) -> &Self {
        assert_eq!(self.video, VideoGrant::host(room), "expected host grant");
        self
    }

    fn assert_guest_for(&self, room: &str) -> &Self {
        assert_eq!(self.video, VideoGrant::guest(room), "expected guest grant");
        self
    }

    fn assert_identity_prefix(&self, prefix: &str) -> &Self {
        let suffix = self
            .sub
            .strip_prefix(prefix)
            .unwrap_or_else(|| panic!("identity '{}' should start with '{}'", self.sub, prefix));

        assert_eq!(suffix.len(), 8, "identity suffix should be 8 chars");
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)),
            "identity suffix should be lowercase hex, got '{suffix}'"
        );
        self
    }

    fn assert_participant_lifetime(&self) -> &Self {
        assert_eq!(self.iss, TEST_API_KEY);
        assert_eq!(self.nbf, self.iat);
        assert_eq!(self.lifetime_secs(), PARTICIPANT_TOKEN_LIFETIME_SECS);
        self
    }
}
