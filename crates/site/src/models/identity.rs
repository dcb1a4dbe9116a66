//! Request-scoped identity types.
//!
//! Resolved per request by the session gate and stored in request
//! extensions. Never cached across requests.

use serde::{Deserialize, Serialize};

use folio_core::UserId;

use super::Profile;

/// A user as known to the hosted identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Identity-service user id (also the profile id).
    pub id: UserId,
    /// Email the user signed in with, when the service reports one.
    #[serde(default)]
    pub email: Option<String>,
}

/// The signed-in user for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

/// The signed-in administrator for the current request.
///
/// Only inserted after the profile lookup confirmed the admin flag.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub identity: UserIdentity,
    pub profile: Profile,
}

impl CurrentAdmin {
    /// Name to greet the admin with in the dashboard.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.profile
            .full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.profile.email)
    }
}
