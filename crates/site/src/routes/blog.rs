//! Public blog pages and reader comments.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use folio_core::{BlogPostId, Email};

use crate::db::{BlogPostRepository, CommentRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{BlogPost, Comment, NewComment};
use crate::services::markdown::render_markdown;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_COMMENT_LEN: usize = 5000;

/// Comment form data.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub content: String,
}

/// Blog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub posts: Vec<BlogPost>,
}

/// Blog post template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogPostTemplate {
    pub post: BlogPost,
    /// Rendered Markdown; raw HTML in the source is escaped.
    pub content_html: String,
    pub comments: Vec<Comment>,
    pub form: CommentForm,
    pub errors: Vec<String>,
    pub notice: Option<String>,
}

/// Check a submitted comment.
///
/// # Errors
///
/// Returns every problem found, in form order.
pub fn validate_comment(
    post_id: BlogPostId,
    form: &CommentForm,
) -> std::result::Result<NewComment, Vec<String>> {
    let mut errors = Vec::new();

    let name = form.name.trim();
    if name.is_empty() {
        errors.push("Name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(format!("Name must be at most {MAX_NAME_LEN} characters"));
    }

    let email = Email::parse(&form.email);
    if let Err(e) = &email {
        errors.push(format!("Invalid email: {e}"));
    }

    let content = form.content.trim();
    if content.is_empty() {
        errors.push("Comment is required".to_string());
    } else if content.chars().count() > MAX_COMMENT_LEN {
        errors.push(format!("Comment must be at most {MAX_COMMENT_LEN} characters"));
    }

    match email {
        Ok(email) if errors.is_empty() => Ok(NewComment {
            post_id,
            name: name.to_string(),
            email,
            content: content.to_string(),
        }),
        _ => Err(errors),
    }
}

/// List published posts.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<BlogIndexTemplate> {
    let posts = BlogPostRepository::new(state.pool())
        .list_published(None)
        .await?;
    Ok(BlogIndexTemplate { posts })
}

async fn load_post(state: &AppState, slug: &str) -> Result<(BlogPost, Vec<Comment>)> {
    let post = BlogPostRepository::new(state.pool())
        .get_published_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))?;
    let comments = CommentRepository::new(state.pool())
        .list_approved_for_post(post.id)
        .await?;
    Ok((post, comments))
}

fn render(
    post: BlogPost,
    comments: Vec<Comment>,
    form: CommentForm,
    errors: Vec<String>,
    notice: Option<String>,
) -> BlogPostTemplate {
    BlogPostTemplate {
        content_html: render_markdown(&post.content),
        post,
        comments,
        form,
        errors,
        notice,
    }
}

/// Show a published post with its approved comments.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<BlogPostTemplate> {
    let (post, comments) = load_post(&state, &slug).await?;
    Ok(render(
        post,
        comments,
        CommentForm::default(),
        Vec::new(),
        None,
    ))
}

/// Accept a reader comment. It stays hidden until approved.
#[instrument(skip(state, form))]
pub async fn comment(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let (post, comments) = load_post(&state, &slug).await?;

    let new_comment = match validate_comment(post.id, &form) {
        Ok(new_comment) => new_comment,
        Err(errors) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                render(post, comments, form, errors, None),
            )
                .into_response());
        }
    };

    let created = CommentRepository::new(state.pool())
        .create(&new_comment)
        .await?;
    tracing::info!(comment_id = %created.id, post_id = %post.id, "Comment submitted");
    add_breadcrumb(
        "blog",
        "Submitted comment",
        Some(&[("post", post.slug.as_str())]),
    );

    Ok(render(
        post,
        comments,
        CommentForm::default(),
        Vec::new(),
        Some("Thanks! Your comment is awaiting approval.".to_string()),
    )
    .into_response())
}
