//! Profile repository and the profile lookup used by the session gate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use folio_core::{Email, UserId};

use super::RepositoryError;
use crate::models::Profile;

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    full_name: Option<String>,
    avatar_url: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: UserId::new(row.id),
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PROFILE_COLUMNS: &str =
    "id, email, full_name, avatar_url, is_admin, created_at, updated_at";

/// Profile lookup by identity id.
///
/// Object-safe so the gate can be exercised against an in-memory store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile for an identity. A missing row is `Ok(None)`.
    async fn get_profile_by_id(&self, id: UserId) -> Result<Option<Profile>, RepositoryError>;
}

/// [`ProfileStore`] backed by the `profiles` table.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile_by_id(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        ProfileRepository::new(&self.pool).get_by_id(id).await
    }
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by identity id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    /// Set or clear the admin flag for the profile with this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no profile has that email.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_admin_by_email(
        &self,
        email: &Email,
        is_admin: bool,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE profiles SET is_admin = $2, updated_at = NOW() \
             WHERE lower(email) = lower($1) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(is_admin)
        .fetch_optional(self.pool)
        .await?;

        row.map(Profile::from).ok_or(RepositoryError::NotFound)
    }

    /// List every profile carrying the admin flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_admins(&self) -> Result<Vec<Profile>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE is_admin ORDER BY email"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }
}
