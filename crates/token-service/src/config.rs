//! Token service configuration.
//!
//! Configuration is loaded once from environment variables at startup and
//! passed explicitly to every component. The API secret is held as a
//! `SecretString` and redacted in Debug output.

use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::net::Ipv6Addr;
use thiserror::Error;

/// Development API key used when `LIVEKIT_API_KEY` is unset.
pub const DEFAULT_API_KEY: &str = "devkey";

/// Development API secret used when `LIVEKIT_API_SECRET` is unset.
pub const DEFAULT_API_SECRET: &str = "secret";

/// Media server URL used when `LIVEKIT_URL` is unset.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:7880";

/// Default listen host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8081;

/// Default timeout for admin API requests in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 10;

/// Overall per-request deadline in seconds. Admin API calls must finish
/// inside it, so `UPSTREAM_TIMEOUT_SECONDS` has to be smaller.
pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Token service configuration.
#[derive(Clone)]
pub struct Config {
    /// API key, used as the `iss` claim of every token.
    pub api_key: String,

    /// API secret used to sign tokens (HS256).
    pub api_secret: SecretString,

    /// Media server URL handed to clients, e.g. "wss://media.example.com".
    pub server_url: String,

    /// Listen host: an IP address or a resolvable hostname (default: "0.0.0.0").
    pub host: String,

    /// Listen port (default: 8081).
    pub port: u16,

    /// Timeout for admin API requests in seconds (default: 10).
    pub upstream_timeout_seconds: u64,
}

/// Custom Debug implementation that redacts the API secret.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} must not be empty")]
    EmptyEnvVar(String),

    #[error("Invalid port configuration: {0}")]
    InvalidPort(String),

    #[error("Invalid upstream timeout configuration: {0}")]
    InvalidUpstreamTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = non_empty(vars, "LIVEKIT_API_KEY", DEFAULT_API_KEY)?;
        let api_secret = non_empty(vars, "LIVEKIT_API_SECRET", DEFAULT_API_SECRET)?;
        let server_url = non_empty(vars, "LIVEKIT_URL", DEFAULT_SERVER_URL)?;

        let host = non_empty(vars, "HOST", DEFAULT_HOST)?.trim().to_string();

        let port = if let Some(value_str) = vars.get("PORT") {
            let value: u16 = value_str.parse().map_err(|e| {
                ConfigError::InvalidPort(format!(
                    "PORT must be an integer between 1 and 65535, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidPort(
                    "PORT must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_PORT
        };

        let upstream_timeout_seconds =
            if let Some(value_str) = vars.get("UPSTREAM_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidUpstreamTimeout(format!(
                        "UPSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidUpstreamTimeout(
                        "UPSTREAM_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                if value >= REQUEST_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidUpstreamTimeout(format!(
                        "UPSTREAM_TIMEOUT_SECONDS must be less than the {}s request timeout, got {}",
                        REQUEST_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_UPSTREAM_TIMEOUT_SECONDS
            };

        Ok(Config {
            api_key,
            api_secret: SecretString::from(api_secret),
            server_url,
            host,
            port,
            upstream_timeout_seconds,
        })
    }

    /// Address to bind, e.g. "0.0.0.0:8081", "[::]:8081" or "localhost:8081".
    ///
    /// IPv6 literals are bracketed. Hostnames are resolved at bind time.
    pub fn bind_address(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// True when the development key or secret is in use.
    pub fn uses_dev_credentials(&self) -> bool {
        self.api_key == DEFAULT_API_KEY || self.api_secret.expose_secret() == DEFAULT_API_SECRET
    }
}

/// Read a variable, falling back to `default` when unset. A variable that
/// is set but blank is a configuration error.
fn non_empty(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match vars.get(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyEnvVar(name.to_string())),
        Some(value) => Ok(value.clone()),
        None => Ok(default.to_string()),
    }
}
