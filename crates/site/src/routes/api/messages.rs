//! Inbox actions.

use axum::{extract::State, response::Redirect};
use tracing::instrument;

use folio_core::MessageId;

use super::{RowId, log_missing};
use crate::db::MessageRepository;
use crate::error::{ApiError, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[instrument(skip(state, _admin))]
pub async fn mark_read(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RowId(id): RowId,
) -> Result<Redirect, ApiError> {
    let changed = MessageRepository::new(state.pool())
        .mark_read(MessageId::new(id))
        .await?;
    log_missing("message", id, changed);
    add_breadcrumb(
        "admin",
        "Marked message read",
        Some(&[("message_id", id.to_string().as_str())]),
    );
    Ok(Redirect::to("/admin/messages"))
}

#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RowId(id): RowId,
) -> Result<Redirect, ApiError> {
    let changed = MessageRepository::new(state.pool())
        .delete(MessageId::new(id))
        .await?;
    log_missing("message", id, changed);
    add_breadcrumb(
        "admin",
        "Deleted message",
        Some(&[("message_id", id.to_string().as_str())]),
    );
    Ok(Redirect::to("/admin/messages"))
}
