//! Admin API.
//!
//! Everything except `/auth/signout` is for administrators. Form posts from
//! the admin pages land here. Each mutation redirects back to
//! the page it came from; errors answer with a JSON `{"error": ...}` body.

mod blog;
mod comments;
mod messages;
mod projects;
mod upload;

use axum::{
    Router,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    routing::post,
};

use super::auth;
use crate::error::ApiError;
use crate::state::AppState;

/// Create the API routes router (nested under `/api`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signout", post(auth::sign_out))
        .route("/comments/{id}/approve", post(comments::approve))
        .route("/comments/{id}/delete", post(comments::delete))
        .route("/messages/{id}/mark-read", post(messages::mark_read))
        .route("/messages/{id}/delete", post(messages::delete))
        .route("/projects/{id}/delete", post(projects::delete))
        .route("/blog/{id}/delete", post(blog::delete))
        .route("/upload", post(upload::upload))
}

/// The numeric `{id}` segment of an API route.
///
/// A malformed id is rejected with the API's JSON error body.
pub struct RowId(pub i64);

impl<S> FromRequestParts<S> for RowId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(id))
    }
}

/// Log a mutation that matched no row. The row is already gone, so the
/// request still succeeds.
fn log_missing(kind: &str, id: i64, changed: bool) {
    if !changed {
        tracing::debug!(kind, id, "No row changed");
    }
}
