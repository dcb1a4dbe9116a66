//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::db::{CommentStore, PgCommentStore, PgProfileStore, ProfileStore};
use crate::services::{
    BlobStore, HostedIdentityClient, HostedStorageClient, IdentityError, IdentityProvider,
    StorageError,
};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    comments: Arc<dyn CommentStore>,
    storage: Arc<dyn BlobStore>,
    content_security_policy: String,
}

impl AppState {
    /// Create a new application state backed by the hosted services.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build.
    pub fn new(config: SiteConfig, pool: PgPool) -> Result<Self, StateError> {
        let identity = Arc::new(HostedIdentityClient::new(&config.backend)?);
        let storage = Arc::new(HostedStorageClient::new(&config.backend)?);
        let profiles = Arc::new(PgProfileStore::new(pool.clone()));
        let comments = Arc::new(PgCommentStore::new(pool.clone()));

        Ok(Self::from_parts(config, pool, identity, profiles, comments, storage))
    }

    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn from_parts(
        config: SiteConfig,
        pool: PgPool,
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        comments: Arc<dyn CommentStore>,
        storage: Arc<dyn BlobStore>,
    ) -> Self {
        let content_security_policy = content_security_policy(&config.backend.origin());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity,
                profiles,
                comments,
                storage,
                content_security_policy,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the identity service client.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get a reference to the profile store.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileStore {
        self.inner.profiles.as_ref()
    }

    /// Get a reference to the comment moderation store.
    #[must_use]
    pub fn comments(&self) -> &dyn CommentStore {
        self.inner.comments.as_ref()
    }

    /// Get a reference to the blob storage client.
    #[must_use]
    pub fn storage(&self) -> &dyn BlobStore {
        self.inner.storage.as_ref()
    }

    /// The `Content-Security-Policy` header value.
    #[must_use]
    pub fn content_security_policy(&self) -> &str {
        &self.inner.content_security_policy
    }
}

/// Build the CSP. Uploaded images are served from the backend origin.
fn content_security_policy(backend_origin: &str) -> String {
    [
        "default-src 'self'".to_string(),
        "script-src 'self'".to_string(),
        "style-src 'self'".to_string(),
        format!("img-src 'self' data: {backend_origin}"),
        "font-src 'self'".to_string(),
        "connect-src 'self'".to_string(),
        "form-action 'self'".to_string(),
        "frame-ancestors 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "object-src 'none'".to_string(),
    ]
    .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_backend_images() {
        let csp = content_security_policy("https://backend.test:8443");
        assert!(csp.contains("img-src 'self' data: https://backend.test:8443"));
        assert!(csp.contains("frame-ancestors 'none'"));
        assert!(csp.starts_with("default-src 'self'; "));
    }
}
