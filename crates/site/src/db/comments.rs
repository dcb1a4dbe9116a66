//! Comment repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use folio_core::{BlogPostId, CommentId, Email};

use super::RepositoryError;
use crate::models::{Comment, CommentWithPost, NewComment};

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    name: String,
    email: String,
    content: String,
    approved: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = RepositoryError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CommentId::new(row.id),
            post_id: BlogPostId::new(row.post_id),
            name: row.name,
            email,
            content: row.content,
            approved: row.approved,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentWithPostRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    post_title: String,
    post_slug: String,
}

impl TryFrom<CommentWithPostRow> for CommentWithPost {
    type Error = RepositoryError;

    fn try_from(row: CommentWithPostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            comment: row.comment.try_into()?,
            post_title: row.post_title,
            post_slug: row.post_slug,
        })
    }
}

/// Moderation actions on comments.
///
/// Object-safe so the admin API can be exercised against an in-memory store.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Mark a comment approved. Returns whether the comment exists.
    async fn approve(&self, id: CommentId) -> Result<bool, RepositoryError>;

    /// Delete a comment. Returns whether a row was removed.
    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError>;
}

/// [`CommentStore`] backed by the `comments` table.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn approve(&self, id: CommentId) -> Result<bool, RepositoryError> {
        CommentRepository::new(&self.pool).approve(id).await
    }

    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        CommentRepository::new(&self.pool).delete(id).await
    }
}

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Approved comments for a post, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_approved_for_post(
        &self,
        post_id: BlogPostId,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r"
            SELECT id, post_id, name, email, content, approved, created_at
            FROM comments
            WHERE post_id = $1 AND approved
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(post_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Every comment with its post, newest first, for moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_posts(&self) -> Result<Vec<CommentWithPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentWithPostRow>(
            r"
            SELECT c.id, c.post_id, c.name, c.email, c.content, c.approved, c.created_at,
                   p.title AS post_title, p.slug AS post_slug
            FROM comments c
            JOIN blog_posts p ON p.id = c.post_id
            ORDER BY c.created_at DESC, c.id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Store a new, unapproved comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, comment: &NewComment) -> Result<Comment, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r"
            INSERT INTO comments (post_id, name, email, content, approved)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, post_id, name, email, content, approved, created_at
            ",
        )
        .bind(comment.post_id)
        .bind(&comment.name)
        .bind(comment.email.as_str())
        .bind(&comment.content)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Mark a comment approved. Approving twice is harmless.
    /// Returns whether the comment exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn approve(&self, id: CommentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE comments SET approved = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a comment. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count comments awaiting moderation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_pending(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE NOT approved")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
