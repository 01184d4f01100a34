//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for the media server API secret
//! and for any bearer token the service handles. `SecretString` implements
//! `Debug` with redaction, so a struct deriving `Debug` that holds one is
//! safe to log.
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct ApiCredentials {
//!     api_key: String,
//!     api_secret: SecretString,
//! }
//!
//! let creds = ApiCredentials {
//!     api_key: "devkey".to_string(),
//!     api_secret: SecretString::from("secret"),
//! };
//!
//! // api_secret prints as [REDACTED]
//! println!("{:?}", creds);
//!
//! // Reading the value must be explicit
//! let secret: &str = creds.api_secret.expose_secret();
//! ```

pub use secrecy::{ExposeSecret, SecretString};
