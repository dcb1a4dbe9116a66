//! Administrator management.
//!
//! Admin access is the `is_admin` flag on a profile. Profiles are created
//! when a user signs up with the identity service, so these commands only
//! flip the flag on existing rows.

use folio_core::{Email, EmailError};
use folio_site::db::{ProfileRepository, RepositoryError, create_pool};
use thiserror::Error;

use super::{DatabaseUrlError, database_url};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Config(#[from] DatabaseUrlError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No profile with that email.
    #[error("No profile found with email: {0}")]
    UnknownProfile(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Grant (`true`) or revoke (`false`) admin access.
///
/// # Errors
///
/// Returns `AdminError::UnknownProfile` if nobody with that email has signed
/// up, or another error if the database is unreachable.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let pool = create_pool(&database_url()?).await?;

    let profile = ProfileRepository::new(&pool)
        .set_admin_by_email(&email, is_admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UnknownProfile(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    if is_admin {
        tracing::info!(email = %profile.email, id = %profile.id, "Admin access granted");
    } else {
        tracing::info!(email = %profile.email, id = %profile.id, "Admin access revoked");
    }
    Ok(())
}

/// Print every admin profile.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), AdminError> {
    let pool = create_pool(&database_url()?).await?;
    let admins = ProfileRepository::new(&pool)
        .list_admins()
        .await
        .map_err(AdminError::Repository)?;

    #[allow(clippy::print_stdout)]
    {
        if admins.is_empty() {
            println!("No admins. Grant access with: folio-cli admin grant -e <email>");
        }
        for admin in admins {
            println!(
                "{}\t{}\t{}",
                admin.email,
                admin.full_name.as_deref().unwrap_or("-"),
                admin.id
            );
        }
    }
    Ok(())
}
