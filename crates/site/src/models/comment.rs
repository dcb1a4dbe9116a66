//! Blog comment model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{BlogPostId, CommentId, Email};

/// A reader comment on a blog post. Hidden until approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: BlogPostId,
    pub name: String,
    pub email: Email,
    pub content: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A comment joined with the post it belongs to, for moderation.
#[derive(Debug, Clone)]
pub struct CommentWithPost {
    pub comment: Comment,
    pub post_title: String,
    pub post_slug: String,
}

/// A validated comment submission.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: BlogPostId,
    pub name: String,
    pub email: Email,
    pub content: String,
}
