//! Token issuance for the media server.
//!
//! - `issuer` - Participant and service token minting

pub mod issuer;

pub use issuer::{IssuedToken, TokenIssuer, PARTICIPANT_TOKEN_TTL};
