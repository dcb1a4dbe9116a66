//! Blog post model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{BlogPostId, Slug};

/// A blog post, published or draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: Slug,
    /// Markdown source.
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub categories: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin can set on a blog post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPostInput {
    pub title: String,
    pub slug: Slug,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub categories: Vec<String>,
    pub published: bool,
}

/// Decide the `published_at` timestamp to store after an edit.
///
/// Publishing stamps `now` unless the post was already published, in which
/// case the original date is kept. Unpublishing clears it.
#[must_use]
pub fn resolve_published_at(
    existing: Option<&BlogPost>,
    publish: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !publish {
        return None;
    }
    match existing {
        Some(post) if post.published => post.published_at.or(Some(now)),
        _ => Some(now),
    }
}
