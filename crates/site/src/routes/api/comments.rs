//! Comment moderation actions.

use axum::{extract::State, response::Redirect};
use tracing::instrument;

use folio_core::CommentId;

use super::{RowId, log_missing};
use crate::error::{ApiError, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Approve a comment so it shows under its post.
#[instrument(skip(state, _admin))]
pub async fn approve(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RowId(id): RowId,
) -> Result<Redirect, ApiError> {
    let changed = state.comments().approve(CommentId::new(id)).await?;
    log_missing("comment", id, changed);
    add_breadcrumb(
        "admin",
        "Approved comment",
        Some(&[("comment_id", id.to_string().as_str())]),
    );
    Ok(Redirect::to("/admin/comments"))
}

/// Delete a comment.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RowId(id): RowId,
) -> Result<Redirect, ApiError> {
    let changed = state.comments().delete(CommentId::new(id)).await?;
    log_missing("comment", id, changed);
    add_breadcrumb(
        "admin",
        "Deleted comment",
        Some(&[("comment_id", id.to_string().as_str())]),
    );
    Ok(Redirect::to("/admin/comments"))
}
