//! Blog post repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use folio_core::{BlogPostId, Slug};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{BlogPost, BlogPostInput};

#[derive(Debug, sqlx::FromRow)]
struct BlogPostRow {
    id: i64,
    title: String,
    slug: String,
    content: String,
    excerpt: Option<String>,
    thumbnail: Option<String>,
    categories: Vec<String>,
    published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BlogPostRow> for BlogPost {
    type Error = RepositoryError;

    fn try_from(row: BlogPostRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;

        Ok(Self {
            id: BlogPostId::new(row.id),
            title: row.title,
            slug,
            content: row.content,
            excerpt: row.excerpt,
            thumbnail: row.thumbnail,
            categories: row.categories,
            published: row.published,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for blog post database operations.
pub struct BlogPostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogPostRepository<'a> {
    /// Create a new blog post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every post, drafts included, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, BlogPostRow>(
            r"
            SELECT id, title, slug, content, excerpt, thumbnail, categories,
                   published, published_at, created_at, updated_at
            FROM blog_posts
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List published posts, most recently published first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug is invalid.
    pub async fn list_published(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<BlogPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, BlogPostRow>(
            r"
            SELECT id, title, slug, content, excerpt, thumbnail, categories,
                   published, published_at, created_at, updated_at
            FROM blog_posts
            WHERE published
            ORDER BY published_at DESC NULLS LAST, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a post by ID, published or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
    pub async fn get(&self, id: BlogPostId) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query_as::<_, BlogPostRow>(
            r"
            SELECT id, title, slug, content, excerpt, thumbnail, categories,
                   published, published_at, created_at, updated_at
            FROM blog_posts
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a published post by slug. Drafts are invisible here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored slug is invalid.
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query_as::<_, BlogPostRow>(
            r"
            SELECT id, title, slug, content, excerpt, thumbnail, categories,
                   published, published_at, created_at, updated_at
            FROM blog_posts
            WHERE slug = $1 AND published
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        input: &BlogPostInput,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<BlogPost, RepositoryError> {
        let row = sqlx::query_as::<_, BlogPostRow>(
            r"
            INSERT INTO blog_posts
                (title, slug, content, excerpt, thumbnail, categories, published, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, slug, content, excerpt, thumbnail, categories,
                      published, published_at, created_at, updated_at
            ",
        )
        .bind(&input.title)
        .bind(input.slug.as_str())
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(&input.thumbnail)
        .bind(&input.categories)
        .bind(input.published)
        .bind(published_at)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("a post with this slug"))?;

        row.try_into()
    }

    /// Update a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: BlogPostId,
        input: &BlogPostInput,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<BlogPost, RepositoryError> {
        let row = sqlx::query_as::<_, BlogPostRow>(
            r"
            UPDATE blog_posts
            SET title = $2, slug = $3, content = $4, excerpt = $5, thumbnail = $6,
                categories = $7, published = $8, published_at = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, slug, content, excerpt, thumbnail, categories,
                      published, published_at, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.title)
        .bind(input.slug.as_str())
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(&input.thumbnail)
        .bind(&input.categories)
        .bind(input.published)
        .bind(published_at)
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique("a post with this slug"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a post and, through the foreign key, its comments.
    /// Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: BlogPostId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count posts by publication state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_published(&self, published: bool) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts WHERE published = $1")
                .bind(published)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
