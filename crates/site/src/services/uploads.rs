//! Image uploads: validation, object naming and storage.

use axum::body::Bytes;
use rand::{Rng, seq::IndexedRandom};
use thiserror::Error;

use super::storage::{BlobStore, StorageError};
use crate::models::SessionToken;

/// Content types accepted for upload.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/avif",
];

const NAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const NAME_RANDOM_LEN: usize = 13;
const MAX_EXTENSION_LEN: usize = 8;
const MAX_BUCKET_LEN: usize = 63;

/// A file received from a form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The upload is not acceptable; the message is shown to the user.
    #[error("{0}")]
    Rejected(String),

    #[error("Error uploading file: {0}")]
    Storage(#[from] StorageError),
}

/// Check that a file is an image within the size limit.
///
/// # Errors
///
/// Returns `UploadError::Rejected` describing the problem.
pub fn validate_image(file: &UploadedFile, max_bytes: usize) -> Result<(), UploadError> {
    if file.bytes.is_empty() {
        return Err(UploadError::Rejected("File is empty".to_string()));
    }
    if !ALLOWED_IMAGE_TYPES.contains(&file.content_type.as_str()) {
        return Err(UploadError::Rejected(format!(
            "Unsupported file type: {}",
            file.content_type
        )));
    }
    if file.bytes.len() > max_bytes {
        return Err(UploadError::Rejected(format!(
            "File is too large (limit is {} KiB)",
            max_bytes / 1024
        )));
    }
    Ok(())
}

/// Check a bucket name supplied by a client.
///
/// # Errors
///
/// Returns `UploadError::Rejected` if the name could escape the bucket path.
pub fn validate_bucket(bucket: &str) -> Result<(), UploadError> {
    let valid = !bucket.is_empty()
        && bucket.len() <= MAX_BUCKET_LEN
        && !bucket.starts_with('.')
        && bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(UploadError::Rejected(format!("Invalid bucket name: {bucket}")))
    }
}

/// Check a folder supplied by a client. Segments are separated by `/`.
///
/// # Errors
///
/// Returns `UploadError::Rejected` if a segment is empty or has other
/// characters than ASCII letters, digits, `-` and `_`.
pub fn validate_folder(folder: &str) -> Result<(), UploadError> {
    let valid = folder.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    });
    if valid {
        Ok(())
    } else {
        Err(UploadError::Rejected(format!("Invalid folder: {folder}")))
    }
}

fn extension(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });
    let from_type = content_type
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .filter(|subtype| {
            !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric())
        });

    from_name
        .or(from_type)
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase)
}

/// A collision-resistant object name: random characters, the upload time
/// in milliseconds and the file's extension.
pub fn object_name<R: Rng + ?Sized>(
    file_name: &str,
    content_type: &str,
    now_millis: i64,
    rng: &mut R,
) -> String {
    let random: String = (0..NAME_RANDOM_LEN)
        .filter_map(|_| NAME_CHARSET.choose(rng).map(|&b| char::from(b)))
        .collect();
    let extension = extension(file_name, content_type);
    format!("{random}_{now_millis}.{extension}")
}

/// Path of an object inside its bucket.
#[must_use]
pub fn object_path(folder: Option<&str>, name: &str) -> String {
    match folder {
        Some(folder) => format!("{folder}/{name}"),
        None => name.to_string(),
    }
}

/// Validate an image, store it and return its public URL.
///
/// # Errors
///
/// Returns `UploadError::Rejected` if the file or destination is not
/// acceptable, and `UploadError::Storage` if the storage service fails.
pub async fn store_image(
    store: &dyn BlobStore,
    token: &SessionToken,
    bucket: &str,
    folder: Option<&str>,
    file: UploadedFile,
    max_bytes: usize,
) -> Result<String, UploadError> {
    validate_bucket(bucket)?;
    if let Some(folder) = folder {
        validate_folder(folder)?;
    }
    validate_image(&file, max_bytes)?;

    let name = object_name(
        &file.file_name,
        &file.content_type,
        chrono::Utc::now().timestamp_millis(),
        &mut rand::rng(),
    );
    let path = object_path(folder, &name);

    store.ensure_bucket(token, bucket, true).await?;
    store
        .upload(token, bucket, &path, &file.content_type, file.bytes)
        .await?;

    Ok(store.public_url(bucket, &path))
}
