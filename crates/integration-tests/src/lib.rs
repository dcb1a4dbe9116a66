//! Integration tests for Folio.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p folio-site &
//! cargo test -p folio-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `FOLIO_BASE_URL` - Server under test (default: `http://localhost:3000`)
//! - `FOLIO_TEST_ADMIN_EMAIL` / `FOLIO_TEST_ADMIN_PASSWORD` - Credentials of
//!   an administrator, for the signed-in tests

use reqwest::{Client, redirect::Policy};

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("FOLIO_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on the gate's `Location` headers.
///
/// # Errors
///
/// Returns an error if the TLS backend fails to initialize.
pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
}

/// Administrator credentials, if configured.
#[must_use]
pub fn admin_credentials() -> Option<(String, String)> {
    let email = std::env::var("FOLIO_TEST_ADMIN_EMAIL").ok()?;
    let password = std::env::var("FOLIO_TEST_ADMIN_PASSWORD").ok()?;
    Some((email, password))
}
