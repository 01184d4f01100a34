//! # Token Service Test Utilities
//!
//! Shared test utilities for the room token service.
//!
//! This crate provides:
//! - Server test harness (`TestTokenServer` for E2E tests)
//! - Token assertions (`decode_test_token`, `TokenAssertions`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ts_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestTokenServer::spawn().await?;
//!
//!     let response = reqwest::Client::new()
//!         .post(format!("{}/token", server.url()))
//!         .json(&serde_json::json!({"room": "studio", "participant": "Alice"}))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_assertions;

// Re-export commonly used items
pub use server_harness::*;
pub use token_assertions::*;
