//! Project repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use folio_core::ProjectId;

use super::RepositoryError;
use crate::models::{Project, ProjectInput};

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    title: String,
    description: String,
    full_description: Option<String>,
    image: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::new(row.id),
            title: row.title,
            description: row.description,
            full_description: row.full_description,
            image: row.image,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for project database operations.
pub struct ProjectRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List projects, newest first, optionally limited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<Project>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r"
            SELECT id, title, description, full_description, image, tags,
                   created_at, updated_at
            FROM projects
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Get a project by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r"
            SELECT id, title, description, full_description, image, tags,
                   created_at, updated_at
            FROM projects
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Project::from))
    }

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProjectInput) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r"
            INSERT INTO projects (title, description, full_description, image, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, full_description, image, tags,
                      created_at, updated_at
            ",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.full_description)
        .bind(&input.image)
        .bind(&input.tags)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a project.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the project does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProjectId,
        input: &ProjectInput,
    ) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r"
            UPDATE projects
            SET title = $2, description = $3, full_description = $4,
                image = $5, tags = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, full_description, image, tags,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.full_description)
        .bind(&input.image)
        .bind(&input.tags)
        .fetch_optional(self.pool)
        .await?;

        row.map(Project::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a project. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProjectId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all projects.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
