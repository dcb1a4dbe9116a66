//! Contact message inbox.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::MessageRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Message;
use crate::state::AppState;

/// Inbox template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/messages.html")]
pub struct MessagesTemplate {
    pub admin_name: String,
    pub unread: Vec<Message>,
    pub read: Vec<Message>,
}

/// List messages, unread ones first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<MessagesTemplate> {
    let (read, unread): (Vec<_>, Vec<_>) = MessageRepository::new(state.pool())
        .list_all()
        .await?
        .into_iter()
        .partition(|m| m.read);

    Ok(MessagesTemplate {
        admin_name: admin.display_name().to_string(),
        unread,
        read,
    })
}
