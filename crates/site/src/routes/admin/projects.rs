//! Admin project management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use folio_core::{ProjectId, join_tags, parse_tags};

use super::upload_error_status;
use crate::db::{ProjectRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::models::{Project, ProjectInput, SessionToken};
use crate::routes::multipart::MultipartForm;
use crate::services::uploads::store_image;
use crate::state::AppState;

/// Project list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/projects/index.html")]
pub struct ProjectsTemplate {
    pub admin_name: String,
    pub projects: Vec<Project>,
}

/// Values shown in the project editor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProjectFormValues {
    pub title: String,
    pub description: String,
    pub full_description: String,
    pub image: String,
    pub tags: String,
}

impl ProjectFormValues {
    fn from_form(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title").to_string(),
            description: form.text("description").to_string(),
            full_description: form.text("full_description").to_string(),
            image: form.text("image").trim().to_string(),
            tags: form.text("tags").to_string(),
        }
    }

    fn from_project(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            description: project.description.clone(),
            full_description: project.full_description.clone().unwrap_or_default(),
            image: project.image.clone(),
            tags: join_tags(&project.tags),
        }
    }

    /// Validate the editor values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first missing required field.
    pub fn to_input(&self) -> std::result::Result<ProjectInput, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err("Short description is required".to_string());
        }
        let full_description = Some(self.full_description.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(ProjectInput {
            title: title.to_string(),
            description: description.to_string(),
            full_description,
            image: self.image.trim().to_string(),
            tags: parse_tags(&self.tags),
        })
    }
}

/// Project editor template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/projects/form.html")]
pub struct ProjectFormTemplate {
    pub admin_name: String,
    pub heading: String,
    pub action: String,
    pub values: ProjectFormValues,
    pub error: Option<String>,
}

/// List projects.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<ProjectsTemplate> {
    let projects = ProjectRepository::new(state.pool()).list(None).await?;
    Ok(ProjectsTemplate {
        admin_name: admin.display_name().to_string(),
        projects,
    })
}

/// Display the new project form.
pub async fn new_page(RequireAdmin(admin): RequireAdmin) -> ProjectFormTemplate {
    ProjectFormTemplate {
        admin_name: admin.display_name().to_string(),
        heading: "New Project".to_string(),
        action: "/admin/projects/new".to_string(),
        values: ProjectFormValues::default(),
        error: None,
    }
}

/// Display the edit form for a project.
#[instrument(skip(state, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<ProjectFormTemplate> {
    let project = ProjectRepository::new(state.pool())
        .get(ProjectId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;

    Ok(ProjectFormTemplate {
        admin_name: admin.display_name().to_string(),
        heading: format!("Edit {}", project.title),
        action: format!("/admin/projects/{id}/edit"),
        values: ProjectFormValues::from_project(&project),
        error: None,
    })
}

/// Read and check the editor form, then upload a chosen image.
///
/// On failure returns the response re-rendering the form.
async fn read_form(
    state: &AppState,
    admin_name: &str,
    session: &SessionToken,
    multipart: Multipart,
    heading: String,
    action: String,
) -> std::result::Result<ProjectInput, Response> {
    let mut form = MultipartForm::read(multipart)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?;
    let values = ProjectFormValues::from_form(&form);

    let rerender = |values: ProjectFormValues, error: String, status: StatusCode| {
        (
            status,
            ProjectFormTemplate {
                admin_name: admin_name.to_string(),
                heading: heading.clone(),
                action: action.clone(),
                values,
                error: Some(error),
            },
        )
            .into_response()
    };

    // Nothing is stored for a form that fails validation.
    let mut input = match values.to_input() {
        Ok(input) => input,
        Err(error) => return Err(rerender(values, error, StatusCode::BAD_REQUEST)),
    };

    if let Some(file) = form.take_file("image_file") {
        let uploads = &state.config().uploads;
        match store_image(
            state.storage(),
            session,
            &uploads.bucket,
            uploads.folder.as_deref(),
            file,
            uploads.max_bytes,
        )
        .await
        {
            Ok(url) => input.image = url,
            Err(e) => {
                tracing::warn!(error = %e, "Project image upload failed");
                let status = upload_error_status(&e);
                return Err(rerender(values, e.to_string(), status));
            }
        }
    }

    Ok(input)
}

/// Create a project.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AdminSession(session): AdminSession,
    multipart: Multipart,
) -> Result<Response> {
    let input = match read_form(
        &state,
        admin.display_name(),
        &session,
        multipart,
        "New Project".to_string(),
        "/admin/projects/new".to_string(),
    )
    .await
    {
        Ok(input) => input,
        Err(response) => return Ok(response),
    };

    let project = ProjectRepository::new(state.pool()).create(&input).await?;
    tracing::info!(project_id = %project.id, "Project created");
    add_breadcrumb("admin", "Created project", None);

    Ok(Redirect::to("/admin/projects").into_response())
}

/// Update a project.
#[instrument(skip(state, admin, session, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AdminSession(session): AdminSession,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Response> {
    let input = match read_form(
        &state,
        admin.display_name(),
        &session,
        multipart,
        "Edit Project".to_string(),
        format!("/admin/projects/{id}/edit"),
    )
    .await
    {
        Ok(input) => input,
        Err(response) => return Ok(response),
    };

    match ProjectRepository::new(state.pool())
        .update(ProjectId::new(id), &input)
        .await
    {
        Ok(project) => {
            tracing::info!(project_id = %project.id, "Project updated");
            Ok(Redirect::to("/admin/projects").into_response())
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("project {id}"))),
        Err(e) => Err(e.into()),
    }
}
