//! Admin pages.
//!
//! Every route here sits behind the session gate's admin check, and every
//! handler also takes [`RequireAdmin`](crate::middleware::RequireAdmin).

pub mod blog;
pub mod comments;
pub mod dashboard;
pub mod messages;
pub mod projects;
pub mod storage;

use axum::{Router, http::StatusCode, routing::get};

use crate::services::UploadError;
use crate::state::AppState;

/// Create the admin routes router (nested under `/admin`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/projects", get(projects::index))
        .route(
            "/projects/new",
            get(projects::new_page).post(projects::create),
        )
        .route(
            "/projects/{id}/edit",
            get(projects::edit_page).post(projects::update),
        )
        .route("/blog", get(blog::index))
        .route("/blog/new", get(blog::new_page).post(blog::create))
        .route("/blog/{id}/edit", get(blog::edit_page).post(blog::update))
        .route("/comments", get(comments::index))
        .route("/messages", get(messages::index))
        .route("/storage", get(storage::index))
        .route(
            "/storage/upload",
            get(storage::upload_page).post(storage::upload),
        )
}

/// Status for a form re-rendered after a failed image upload.
const fn upload_error_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::Rejected(_) => StatusCode::BAD_REQUEST,
        UploadError::Storage(_) => StatusCode::BAD_GATEWAY,
    }
}
