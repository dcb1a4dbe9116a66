//! Project actions.

use axum::{extract::State, response::Redirect};
use tracing::instrument;

use folio_core::ProjectId;

use super::{RowId, log_missing};
use crate::db::ProjectRepository;
use crate::error::{ApiError, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Delete a project.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RowId(id): RowId,
) -> Result<Redirect, ApiError> {
    let changed = ProjectRepository::new(state.pool())
        .delete(ProjectId::new(id))
        .await?;
    log_missing("project", id, changed);
    add_breadcrumb(
        "admin",
        "Deleted project",
        Some(&[("project_id", id.to_string().as_str())]),
    );
    Ok(Redirect::to("/admin/projects"))
}
