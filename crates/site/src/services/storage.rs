//! Hosted blob storage client.
//!
//! Uploaded images live in public buckets on the hosted storage service.
//! Writes are made with the signed-in admin's access token so the service's
//! own policies apply; reads go through public URLs.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::models::SessionToken;

/// Objects returned by one listing call.
pub const LIST_LIMIT: usize = 100;

/// Placeholder object the service creates for empty folders.
const FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the storage service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an unexpected status.
    #[error("storage service error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service answered with a body we could not read.
    #[error("parse error: {0}")]
    Parse(String),
}

/// An object in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object name within its folder.
    pub name: String,
    /// Full path within the bucket.
    pub path: String,
    pub public_url: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Blob storage operations used by the site.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket(
        &self,
        token: &SessionToken,
        bucket: &str,
        public: bool,
    ) -> Result<(), StorageError>;

    /// Store an object, replacing any object at the same path.
    async fn upload(
        &self,
        token: &SessionToken,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), StorageError>;

    /// List objects under a folder, newest first.
    async fn list(
        &self,
        token: &SessionToken,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<StoredObject>, StorageError>;

    /// Public URL of an object. Does not check that the object exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    mimetype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    /// Null for folders.
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Option<ObjectMetadata>,
}

fn object_path(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}/{name}", prefix.trim_end_matches('/')),
        _ => name.to_string(),
    }
}

/// [`BlobStore`] over the hosted service's REST API.
#[derive(Clone)]
pub struct HostedStorageClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

impl HostedStorageClient {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/storage/v1/{path}", self.base_url)
    }

    fn authed(
        &self,
        request: reqwest::RequestBuilder,
        token: &SessionToken,
    ) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(&token.access_token)
    }

    async fn api_error(response: reqwest::Response) -> StorageError {
        StorageError::Api {
            status: response.status().as_u16(),
            message: super::error_message(response).await,
        }
    }
}

#[async_trait]
impl BlobStore for HostedStorageClient {
    async fn ensure_bucket(
        &self,
        token: &SessionToken,
        bucket: &str,
        public: bool,
    ) -> Result<(), StorageError> {
        let response = self
            .authed(
                self.client.get(self.url(&format!("bucket/{bucket}"))),
                token,
            )
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }
        if !matches!(status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
            return Err(Self::api_error(response).await);
        }

        tracing::info!(bucket, public, "Creating storage bucket");
        let response = self
            .authed(self.client.post(self.url("bucket")), token)
            .json(&serde_json::json!({ "id": bucket, "name": bucket, "public": public }))
            .send()
            .await?;

        // Losing a creation race is fine.
        if response.status().is_success() || response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        let err = Self::api_error(response).await;
        match err {
            StorageError::Api { ref message, .. } if message.contains("already exists") => Ok(()),
            err => Err(err),
        }
    }

    async fn upload(
        &self,
        token: &SessionToken,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), StorageError> {
        let size = bytes.len();
        let response = self
            .authed(
                self.client.post(self.url(&format!("object/{bucket}/{path}"))),
                token,
            )
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        tracing::info!(bucket, path, size, "Stored object");
        Ok(())
    }

    async fn list(
        &self,
        token: &SessionToken,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<StoredObject>, StorageError> {
        let response = self
            .authed(
                self.client.post(self.url(&format!("object/list/{bucket}"))),
                token,
            )
            .json(&serde_json::json!({
                "prefix": prefix.unwrap_or(""),
                "limit": LIST_LIMIT,
                "offset": 0,
                "sortBy": { "column": "created_at", "order": "desc" },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let entries: Vec<ListEntry> = response
            .json()
            .await
            .map_err(|e| StorageError::Parse(e.to_string()))?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.id.is_some() && entry.name != FOLDER_PLACEHOLDER)
            .map(|entry| {
                let path = object_path(prefix, &entry.name);
                let (size, content_type) = entry
                    .metadata
                    .map_or((None, None), |m| (m.size, m.mimetype));
                StoredObject {
                    public_url: self.public_url(bucket, &path),
                    name: entry.name,
                    path,
                    size,
                    content_type,
                    created_at: entry.created_at,
                }
            })
            .collect())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.url(&format!("object/public/{bucket}/{path}"))
    }
}
