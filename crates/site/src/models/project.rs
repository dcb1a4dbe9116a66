//! Project showcase model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::ProjectId;

/// A portfolio project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    /// Short description shown on cards.
    pub description: String,
    /// Long-form description shown on the detail page.
    pub full_description: Option<String>,
    /// Image URL; empty when the project has no image.
    pub image: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// The image URL, if one is set.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        Some(self.image.as_str()).filter(|s| !s.trim().is_empty())
    }
}

/// Fields an admin can set on a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub full_description: Option<String>,
    pub image: String,
    pub tags: Vec<String>,
}
