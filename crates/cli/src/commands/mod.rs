//! CLI command implementations.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by commands that need the database.
#[derive(Debug, Error)]
pub enum DatabaseUrlError {
    #[error("Missing environment variable: FOLIO_DATABASE_URL (or DATABASE_URL)")]
    Missing,
}

/// Read the database URL, loading `.env` first.
///
/// # Errors
///
/// Returns `DatabaseUrlError::Missing` if neither variable is set.
pub fn database_url() -> Result<SecretString, DatabaseUrlError> {
    dotenvy::dotenv().ok();

    std::env::var("FOLIO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| DatabaseUrlError::Missing)
}
