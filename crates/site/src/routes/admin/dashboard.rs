//! Admin dashboard.

use std::future::Future;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::{
    BlogPostRepository, CommentRepository, MessageRepository, ProjectRepository, RepositoryError,
};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Counts shown on the dashboard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub projects: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub pending_comments: i64,
    pub unread_messages: i64,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin_name: String,
    pub stats: DashboardStats,
}

/// A count, or 0 if it could not be read.
async fn count_or_zero(
    what: &str,
    count: impl Future<Output = Result<i64, RepositoryError>>,
) -> i64 {
    match count.await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(what, error = %e, "Dashboard count failed");
            0
        }
    }
}

/// Display the dashboard.
#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> DashboardTemplate {
    let pool = state.pool();
    let projects = ProjectRepository::new(pool);
    let posts = BlogPostRepository::new(pool);
    let comments = CommentRepository::new(pool);
    let messages = MessageRepository::new(pool);

    let published = posts.count_by_published(true);
    let drafts = posts.count_by_published(false);
    let pending = comments.count_pending();
    let unread = messages.count_unread();

    let stats = DashboardStats {
        projects: count_or_zero("projects", projects.count()).await,
        published_posts: count_or_zero("published posts", published).await,
        draft_posts: count_or_zero("draft posts", drafts).await,
        pending_comments: count_or_zero("pending comments", pending).await,
        unread_messages: count_or_zero("unread messages", unread).await,
    };

    DashboardTemplate {
        admin_name: admin.display_name().to_string(),
        stats,
    }
}
