//! Extractors for admin handlers.
//!
//! The session gate has already decided by the time a handler runs; these
//! extractors only read what the gate left in the request extensions. If the
//! gate did not run for a route they reject, so a routing mistake cannot
//! expose an admin handler.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::ApiError;
use crate::models::{CurrentAdmin, SessionToken};

/// Extractor that requires an administrator.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name())
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Extractor for the admin's session, for calls made on their behalf.
pub struct AdminSession(pub SessionToken);

/// Rejection when a handler's admin requirement is not met.
#[derive(Debug)]
pub enum AdminRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// 401 JSON (for API requests).
    Unauthorized,
}

impl AdminRejection {
    /// Pick the rejection from the request path as the client sent it.
    /// Nested routers see a stripped URI, so prefer [`OriginalUri`].
    fn for_request(parts: &Parts) -> Self {
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |original| original.0.path());
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => ApiError::Unauthorized.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AdminRejection::for_request(parts))
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if parts.extensions.get::<CurrentAdmin>().is_none() {
            return Err(AdminRejection::for_request(parts));
        }
        parts
            .extensions
            .get::<SessionToken>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AdminRejection::for_request(parts))
    }
}
