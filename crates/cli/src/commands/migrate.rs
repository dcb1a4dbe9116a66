//! Database migration command.
//!
//! Migrations live in `crates/site/migrations/` and are embedded at compile
//! time. The site never runs them on startup.
//!
//! # Environment Variables
//!
//! - `FOLIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use folio_site::db::create_pool;
use thiserror::Error;

use super::{DatabaseUrlError, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] DatabaseUrlError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../site/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
