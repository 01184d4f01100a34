//! Common types shared across the room token service crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for access token claims, grants, and HS256 signing
pub mod jwt;
