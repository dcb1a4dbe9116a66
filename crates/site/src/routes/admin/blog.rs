//! Admin blog management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use folio_core::{BlogPostId, Slug, join_tags, parse_tags};

use super::upload_error_status;
use crate::db::{BlogPostRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::models::{BlogPost, BlogPostInput, SessionToken, resolve_published_at};
use crate::routes::multipart::MultipartForm;
use crate::services::uploads::store_image;
use crate::state::AppState;

/// Post list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/blog/index.html")]
pub struct BlogPostsTemplate {
    pub admin_name: String,
    pub posts: Vec<BlogPost>,
}

/// Values shown in the post editor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlogFormValues {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub thumbnail: String,
    pub categories: String,
    pub published: bool,
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl BlogFormValues {
    fn from_form(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title").to_string(),
            slug: form.text("slug").trim().to_string(),
            content: form.text("content").to_string(),
            excerpt: form.text("excerpt").to_string(),
            thumbnail: form.text("thumbnail").trim().to_string(),
            categories: form.text("categories").to_string(),
            published: form.flag("published"),
        }
    }

    fn from_post(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.to_string(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            thumbnail: post.thumbnail.clone().unwrap_or_default(),
            categories: join_tags(&post.categories),
            published: post.published,
        }
    }

    /// Validate the editor values. An empty slug is derived from the title.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first problem found.
    pub fn to_input(&self) -> std::result::Result<BlogPostInput, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let content = self.content.trim();
        if content.is_empty() {
            return Err("Content is required".to_string());
        }
        let slug = if self.slug.is_empty() {
            Slug::from_title(title)
        } else {
            Slug::parse(&self.slug)
        }
        .map_err(|e| format!("Invalid slug: {e}"))?;

        Ok(BlogPostInput {
            title: title.to_string(),
            slug,
            content: content.to_string(),
            excerpt: non_empty(&self.excerpt),
            thumbnail: non_empty(&self.thumbnail),
            categories: parse_tags(&self.categories),
            published: self.published,
        })
    }
}

/// Post editor template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/blog/form.html")]
pub struct BlogFormTemplate {
    pub admin_name: String,
    pub heading: String,
    pub action: String,
    pub values: BlogFormValues,
    pub error: Option<String>,
}

/// Where an editor form posts and how it is titled.
struct Editor {
    admin_name: String,
    heading: String,
    action: String,
}

impl Editor {
    fn render(&self, values: BlogFormValues, error: Option<String>) -> BlogFormTemplate {
        BlogFormTemplate {
            admin_name: self.admin_name.clone(),
            heading: self.heading.clone(),
            action: self.action.clone(),
            values,
            error,
        }
    }

    fn reject(&self, status: StatusCode, values: BlogFormValues, error: String) -> Response {
        (status, self.render(values, Some(error))).into_response()
    }
}

/// List every post, drafts included.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<BlogPostsTemplate> {
    let posts = BlogPostRepository::new(state.pool()).list_all().await?;
    Ok(BlogPostsTemplate {
        admin_name: admin.display_name().to_string(),
        posts,
    })
}

/// Display the new post form.
pub async fn new_page(RequireAdmin(admin): RequireAdmin) -> BlogFormTemplate {
    Editor {
        admin_name: admin.display_name().to_string(),
        heading: "New Post".to_string(),
        action: "/admin/blog/new".to_string(),
    }
    .render(BlogFormValues::default(), None)
}

/// Display the edit form for a post.
#[instrument(skip(state, admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<BlogFormTemplate> {
    let post = BlogPostRepository::new(state.pool())
        .get(BlogPostId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;

    Ok(Editor {
        admin_name: admin.display_name().to_string(),
        heading: format!("Edit {}", post.title),
        action: format!("/admin/blog/{id}/edit"),
    }
    .render(BlogFormValues::from_post(&post), None))
}

/// Read and check the editor form, then upload a chosen thumbnail.
///
/// On failure returns the response re-rendering the form.
async fn read_form(
    state: &AppState,
    editor: &Editor,
    session: &SessionToken,
    multipart: Multipart,
) -> std::result::Result<(BlogFormValues, BlogPostInput), Response> {
    let mut form = MultipartForm::read(multipart)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()).into_response())?;
    let mut values = BlogFormValues::from_form(&form);

    // Nothing is stored for a form that fails validation.
    let mut input = match values.to_input() {
        Ok(input) => input,
        Err(error) => return Err(editor.reject(StatusCode::BAD_REQUEST, values, error)),
    };

    if let Some(file) = form.take_file("thumbnail_file") {
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
            Ok(url) => {
                input.thumbnail = Some(url.clone());
                values.thumbnail = url;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Thumbnail upload failed");
                return Err(editor.reject(
                    upload_error_status(&e),
                    values,
                    e.to_string(),
                ));
            }
        }
    }

    Ok((values, input))
}

/// Create a post.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AdminSession(session): AdminSession,
    multipart: Multipart,
) -> Result<Response> {
    let editor = Editor {
        admin_name: admin.display_name().to_string(),
        heading: "New Post".to_string(),
        action: "/admin/blog/new".to_string(),
    };
    let (values, input) = match read_form(&state, &editor, &session, multipart).await {
        Ok(read) => read,
        Err(response) => return Ok(response),
    };

    let published_at = resolve_published_at(None, input.published, chrono::Utc::now());
    match BlogPostRepository::new(state.pool())
        .create(&input, published_at)
        .await
    {
        Ok(post) => {
            tracing::info!(post_id = %post.id, slug = %post.slug, published = post.published, "Post created");
            add_breadcrumb(
                "admin",
                "Created post",
                Some(&[("slug", post.slug.as_str())]),
            );
            Ok(Redirect::to("/admin/blog").into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            Ok(editor.reject(StatusCode::CONFLICT, values, message))
        }
        Err(e) => Err(e.into()),
    }
}

/// Update a post.
#[instrument(skip(state, admin, session, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AdminSession(session): AdminSession,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Response> {
    let posts = BlogPostRepository::new(state.pool());
    let existing = posts
        .get(BlogPostId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;

    let editor = Editor {
        admin_name: admin.display_name().to_string(),
        heading: format!("Edit {}", existing.title),
        action: format!("/admin/blog/{id}/edit"),
    };
    let (values, input) = match read_form(&state, &editor, &session, multipart).await {
        Ok(read) => read,
        Err(response) => return Ok(response),
    };

    let published_at = resolve_published_at(Some(&existing), input.published, chrono::Utc::now());
    match posts.update(existing.id, &input, published_at).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, published = post.published, "Post updated");
            Ok(Redirect::to("/admin/blog").into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            Ok(editor.reject(StatusCode::CONFLICT, values, message))
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("post {id}"))),
        Err(e) => Err(e.into()),
    }
}
