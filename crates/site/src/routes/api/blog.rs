//! Blog post actions.

use axum::{extract::State, response::Redirect};
use tracing::instrument;

use folio_core::BlogPostId;

use super::{RowId, log_missing};
use crate::db::BlogPostRepository;
use crate::error::{ApiError, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Delete a post along with its comments.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RowId(id): RowId,
) -> Result<Redirect, ApiError> {
    let changed = BlogPostRepository::new(state.pool())
        .delete(BlogPostId::new(id))
        .await?;
    log_missing("post", id, changed);
    add_breadcrumb(
        "admin",
        "Deleted post",
        Some(&[("post_id", id.to_string().as_str())]),
    );
    Ok(Redirect::to("/admin/blog"))
}
