//! Browsing and uploading images in the configured bucket.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use super::upload_error_status;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{AdminSession, RequireAdmin};
use crate::routes::multipart::MultipartForm;
use crate::services::StoredObject;
use crate::services::uploads::store_image;
use crate::state::AppState;

/// Object list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/storage/index.html")]
pub struct StorageTemplate {
    pub admin_name: String,
    pub bucket: String,
    pub folder: Option<String>,
    pub objects: Vec<StoredObject>,
}

/// Upload form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/storage/upload.html")]
pub struct UploadTemplate {
    pub admin_name: String,
    pub bucket: String,
    pub error: Option<String>,
}

/// List the objects in the upload folder, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AdminSession(session): AdminSession,
) -> Result<StorageTemplate> {
    let uploads = &state.config().uploads;
    let objects = state
        .storage()
        .list(&session, &uploads.bucket, uploads.folder.as_deref())
        .await
        .map_err(AppError::Storage)?;

    Ok(StorageTemplate {
        admin_name: admin.display_name().to_string(),
        bucket: uploads.bucket.clone(),
        folder: uploads.folder.clone(),
        objects,
    })
}

/// Display the upload form.
pub async fn upload_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> UploadTemplate {
    UploadTemplate {
        admin_name: admin.display_name().to_string(),
        bucket: state.config().uploads.bucket.clone(),
        error: None,
    }
}

/// Store the chosen image and return to the object list.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AdminSession(session): AdminSession,
    multipart: Multipart,
) -> Result<Response> {
    let uploads = &state.config().uploads;
    let reject = |status: StatusCode, error: String| {
        (
            status,
            UploadTemplate {
                admin_name: admin.display_name().to_string(),
                bucket: uploads.bucket.clone(),
                error: Some(error),
            },
        )
            .into_response()
    };

    let mut form = MultipartForm::read(multipart)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    let Some(file) = form.take_file("file") else {
        return Ok(reject(
            StatusCode::BAD_REQUEST,
            "Choose a file to upload".to_string(),
        ));
    };

    match store_image(
        state.storage(),
        &session,
        &uploads.bucket,
        uploads.folder.as_deref(),
        file,
        uploads.max_bytes,
    )
    .await
    {
        Ok(url) => {
            tracing::info!(url = %url, "Image uploaded");
            add_breadcrumb("admin", "Uploaded image", Some(&[("url", url.as_str())]));
            Ok(Redirect::to("/admin/storage").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Image upload failed");
            Ok(reject(upload_error_status(&e), e.to_string()))
        }
    }
}
