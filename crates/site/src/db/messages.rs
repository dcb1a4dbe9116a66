//! Contact message repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use folio_core::{Email, MessageId};

use super::RepositoryError;
use crate::models::{Message, NewMessage};

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    name: String,
    email: String,
    subject: String,
    message: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: MessageId::new(row.id),
            name: row.name,
            email,
            subject: row.subject,
            message: row.message,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

/// Repository for contact message database operations.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every message, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r"
            SELECT id, name, email, subject, message, read, created_at
            FROM messages
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Store a new, unread message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r"
            INSERT INTO messages (name, email, subject, message, read)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, name, email, subject, message, read, created_at
            ",
        )
        .bind(&message.name)
        .bind(message.email.as_str())
        .bind(&message.subject)
        .bind(&message.message)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Mark a message read. Returns whether the message exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_read(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE messages SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a message. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count unread messages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_unread(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE NOT read")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
