//! Profile model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::UserId;

/// Extension of a user identity carrying the administrator flag.
///
/// Rows are created by a database trigger when the identity service
/// registers a user; the site never deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
