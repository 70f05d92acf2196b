//! Integration tests for the order intake API.
//!
//! These tests talk to a running server over HTTP and are `#[ignore]`d by
//! default. In-process router tests live in the API crate.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the API with a test-mode EasyPost key
//! cargo run -p order-intake-api
//!
//! # Run the live tests
//! API_BASE_URL=http://localhost:3000 API_TEST_ORIGIN=http://localhost:5173 \
//!     cargo test -p order-intake-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `API_BASE_URL` - Server under test (default: `http://localhost:3000`)
//! - `API_TEST_ORIGIN` - An origin in the server's `CORS_ALLOWED_ORIGINS`
//!   (default: `http://localhost:5173`)

use reqwest::Client;

/// Base URL for the API under test.
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// An origin the server under test is configured to allow.
#[must_use]
pub fn test_origin() -> String {
    std::env::var("API_TEST_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string())
}

/// HTTP client for live tests.
///
/// # Errors
///
/// Returns an error if the client cannot be built (TLS backend failure).
pub fn client() -> reqwest::Result<Client> {
    Client::builder().build()
}
