//! Room Token Service Library
//!
//! A stateless HTTP facade in front of a LiveKit-compatible media server:
//!
//! - Issues signed participant tokens (host or guest) for a room
//! - Passes room administration (create, list, kick) through to the
//!   media server admin API
//! - Starts and stops recordings and RTMP streams
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> auth::TokenIssuer
//!                                -> services/*.rs -> media server (Twirp JSON)
//! ```
//!
//! # Modules
//!
//! - `auth` - Participant and service token issuance
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Request and response bodies
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Media server admin API clients

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
