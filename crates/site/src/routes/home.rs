//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::{BlogPostRepository, ProjectRepository};
use crate::error::Result;
use crate::filters;
use crate::models::{BlogPost, Project};
use crate::state::AppState;

/// Projects and posts featured on the home page.
const FEATURED_COUNT: i64 = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub projects: Vec<Project>,
    pub posts: Vec<BlogPost>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let projects = ProjectRepository::new(state.pool())
        .list(Some(FEATURED_COUNT))
        .await?;
    let posts = BlogPostRepository::new(state.pool())
        .list_published(Some(FEATURED_COUNT))
        .await?;

    Ok(HomeTemplate { projects, posts })
}
