//! Public project pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use folio_core::ProjectId;

use crate::db::ProjectRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Project;
use crate::state::AppState;

/// Project listing template.
#[derive(Template, WebTemplate)]
#[template(path = "projects/index.html")]
pub struct ProjectsTemplate {
    pub projects: Vec<Project>,
}

/// Project detail template.
#[derive(Template, WebTemplate)]
#[template(path = "projects/show.html")]
pub struct ProjectTemplate {
    pub project: Project,
}

/// List every project, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<ProjectsTemplate> {
    let projects = ProjectRepository::new(state.pool()).list(None).await?;
    Ok(ProjectsTemplate { projects })
}

/// Show one project.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> Result<ProjectTemplate> {
    let project = ProjectRepository::new(state.pool())
        .get(ProjectId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;

    Ok(ProjectTemplate { project })
}
