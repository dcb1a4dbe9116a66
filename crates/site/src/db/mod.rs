//! Database operations for the site `PostgreSQL`.
//!
//! ## Tables
//!
//! - `profiles` - One row per identity-service user, carries `is_admin`
//! - `projects` - Portfolio projects
//! - `blog_posts` - Markdown posts, published or draft
//! - `comments` - Reader comments awaiting or past moderation
//! - `messages` - Contact form submissions
//!
//! # Migrations
//!
//! Migrations are stored in `crates/site/migrations/` and run via:
//! ```bash
//! cargo run -p folio-cli -- migrate
//! ```

pub mod blog_posts;
pub mod comments;
pub mod messages;
pub mod profiles;
pub mod projects;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use blog_posts::BlogPostRepository;
pub use comments::{CommentRepository, CommentStore, PgCommentStore};
pub use messages::MessageRepository;
pub use profiles::{PgProfileStore, ProfileRepository, ProfileStore};
pub use projects::ProjectRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
fn conflict_on_unique(what: &str) -> impl FnOnce(sqlx::Error) -> RepositoryError + '_ {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        RepositoryError::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
