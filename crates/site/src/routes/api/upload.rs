//! Image upload endpoint used by the editors.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{ApiError, add_breadcrumb};
use crate::middleware::{AdminSession, RequireAdmin};
use crate::routes::multipart::MultipartForm;
use crate::services::uploads::store_image;
use crate::state::AppState;

/// Store an image in the named bucket and return its public URL.
///
/// Expects multipart fields `file` and `bucket`, and optionally `folder`.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AdminSession(session): AdminSession,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = MultipartForm::read(multipart)
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let bucket = form.text("bucket").trim().to_string();
    let folder = Some(form.text("folder").trim().trim_matches('/'))
        .filter(|f| !f.is_empty())
        .map(str::to_string);
    let file = match form.take_file("file") {
        Some(file) if !bucket.is_empty() => file,
        _ => return Err(ApiError::BadRequest("File and bucket are required".to_string())),
    };

    let url = store_image(
        state.storage(),
        &session,
        &bucket,
        folder.as_deref(),
        file,
        state.config().uploads.max_bytes,
    )
    .await?;

    tracing::info!(bucket = %bucket, url = %url, "Image uploaded");
    add_breadcrumb(
        "admin",
        "Uploaded image",
        Some(&[("bucket", bucket.as_str())]),
    );

    Ok(Json(json!({ "success": true, "publicUrl": url })))
}
