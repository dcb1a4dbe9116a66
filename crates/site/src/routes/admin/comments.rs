//! Comment moderation.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::CommentRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::CommentWithPost;
use crate::state::AppState;

/// Moderation queue template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/comments.html")]
pub struct CommentsTemplate {
    pub admin_name: String,
    pub pending: Vec<CommentWithPost>,
    pub approved: Vec<CommentWithPost>,
}

/// List comments, pending ones first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<CommentsTemplate> {
    let (approved, pending): (Vec<_>, Vec<_>) = CommentRepository::new(state.pool())
        .list_with_posts()
        .await?
        .into_iter()
        .partition(|c| c.comment.approved);

    Ok(CommentsTemplate {
        admin_name: admin.display_name().to_string(),
        pending,
        approved,
    })
}
