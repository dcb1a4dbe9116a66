//! Clients and helpers sitting between handlers and the outside world.
//!
//! # Services
//!
//! - `identity` - Hosted identity service (sign-in, session resolution, sign-out)
//! - `storage` - Hosted blob storage for uploaded images
//! - `uploads` - Image validation and object naming for uploads
//! - `markdown` - Blog post rendering

pub mod identity;
pub mod markdown;
pub mod storage;
pub mod uploads;

pub use identity::{HostedIdentityClient, IdentityError, IdentityProvider, Resolution};
pub use storage::{BlobStore, HostedStorageClient, StorageError, StoredObject};
pub use uploads::{UploadError, UploadedFile};

/// Pull a human-readable message out of an error response body.
///
/// The hosted service answers with JSON carrying one of `message`,
/// `error_description`, `msg` or `error`; anything else is returned verbatim.
async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or(text)
}
