//! In-memory collaborators for router and gate tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Bytes;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use folio_core::{CommentId, UserId};

use crate::config::SiteConfig;
use crate::db::{CommentStore, ProfileStore, RepositoryError};
use crate::models::{Profile, SessionToken, UserIdentity};
use crate::services::{
    BlobStore, IdentityError, IdentityProvider, Resolution, StorageError, StoredObject,
};
use crate::state::AppState;

pub fn identity(email: &str) -> UserIdentity {
    UserIdentity {
        id: UserId::new(Uuid::new_v4()),
        email: Some(email.to_string()),
    }
}

pub fn admin_profile(identity: &UserIdentity, is_admin: bool) -> Profile {
    let now = chrono::Utc::now();
    Profile {
        id: identity.id,
        email: identity.email.clone().unwrap_or_default(),
        full_name: Some("Ada Lovelace".to_string()),
        avatar_url: None,
        is_admin,
        created_at: now,
        updated_at: now,
    }
}

pub fn token(access: &str) -> SessionToken {
    SessionToken {
        access_token: access.to_string(),
        refresh_token: format!("{access}-refresh"),
        expires_at: chrono::Utc::now().timestamp() + 3600,
    }
}

/// How the fake identity service treats an access token.
#[derive(Debug, Clone)]
pub enum FakeSession {
    Valid(UserIdentity),
    Rotated(UserIdentity, SessionToken),
    Rejected,
    Outage,
}

#[derive(Default)]
pub struct FakeIdentity {
    sessions: HashMap<String, FakeSession>,
    credentials: HashMap<String, (String, SessionToken)>,
    resolve_calls: AtomicUsize,
    signed_out: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub fn with(mut self, access_token: &str, session: FakeSession) -> Self {
        self.sessions.insert(access_token.to_string(), session);
        self
    }

    pub fn with_credentials(mut self, email: &str, password: &str, session: SessionToken) -> Self {
        self.credentials
            .insert(email.to_string(), (password.to_string(), session));
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn signed_out(&self) -> Vec<String> {
        self.signed_out.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn resolve(&self, token: &SessionToken) -> Result<Option<Resolution>, IdentityError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match self.sessions.get(&token.access_token) {
            Some(FakeSession::Valid(identity)) => Ok(Some(Resolution {
                identity: identity.clone(),
                rotated: None,
            })),
            Some(FakeSession::Rotated(identity, rotated)) => Ok(Some(Resolution {
                identity: identity.clone(),
                rotated: Some(rotated.clone()),
            })),
            Some(FakeSession::Outage) => Err(IdentityError::Api {
                status: 503,
                message: "unavailable".to_string(),
            }),
            Some(FakeSession::Rejected) | None => Ok(None),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionToken, IdentityError> {
        match self.credentials.get(email) {
            Some((expected, session)) if expected == password.expose_secret() => {
                Ok(session.clone())
            }
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityError> {
        self.signed_out
            .lock()
            .unwrap()
            .push(token.access_token.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    profiles: HashMap<UserId, Profile>,
    failing: bool,
    lookups: AtomicUsize,
}

impl FakeProfiles {
    pub fn with(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile.id, profile);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn get_profile_by_id(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(RepositoryError::DataCorruption("profile store offline".to_string()));
        }
        Ok(self.profiles.get(&id).cloned())
    }
}

/// Comments by id, mapped to their approval flag.
#[derive(Default)]
pub struct FakeComments {
    comments: Mutex<BTreeMap<i64, bool>>,
}

impl FakeComments {
    pub fn with_pending(self, id: i64) -> Self {
        self.comments.lock().unwrap().insert(id, false);
        self
    }

    /// `None` once the comment is gone.
    pub fn approved(&self, id: i64) -> Option<bool> {
        self.comments.lock().unwrap().get(&id).copied()
    }
}

#[async_trait]
impl CommentStore for FakeComments {
    async fn approve(&self, id: CommentId) -> Result<bool, RepositoryError> {
        let mut comments = self.comments.lock().unwrap();
        let Some(approved) = comments.get_mut(&id.as_i64()) else {
            return Ok(false);
        };
        *approved = true;
        Ok(true)
    }

    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        Ok(self.comments.lock().unwrap().remove(&id.as_i64()).is_some())
    }
}

/// An upload the fake blob store received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub size: usize,
    pub access_token: String,
}

#[derive(Default)]
pub struct FakeBlobs {
    uploads: Mutex<Vec<StoredUpload>>,
    objects: Vec<StoredObject>,
    failing: bool,
}

impl FakeBlobs {
    pub fn with_object(mut self, bucket: &str, path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let public_url = self.public_url(bucket, path);
        self.objects.push(StoredObject {
            name,
            path: path.to_string(),
            public_url,
            size: Some(1024),
            content_type: Some("image/png".to_string()),
            created_at: Some(chrono::Utc::now()),
        });
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn uploads(&self) -> Vec<StoredUpload> {
        self.uploads.lock().unwrap().clone()
    }

    fn outage() -> StorageError {
        StorageError::Api {
            status: 500,
            message: "storage offline".to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn ensure_bucket(
        &self,
        _token: &SessionToken,
        _bucket: &str,
        _public: bool,
    ) -> Result<(), StorageError> {
        if self.failing {
            return Err(Self::outage());
        }
        Ok(())
    }

    async fn upload(
        &self,
        token: &SessionToken,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<(), StorageError> {
        if self.failing {
            return Err(Self::outage());
        }
        self.uploads.lock().unwrap().push(StoredUpload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len(),
            access_token: token.access_token.clone(),
        });
        Ok(())
    }

    async fn list(
        &self,
        _token: &SessionToken,
        _bucket: &str,
        _prefix: Option<&str>,
    ) -> Result<Vec<StoredObject>, StorageError> {
        if self.failing {
            return Err(Self::outage());
        }
        Ok(self.objects.clone())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://backend.test:8443/storage/v1/object/public/{bucket}/{path}")
    }
}

/// State over the fakes. The pool is lazy and never connected.
pub fn test_state(
    identity: Arc<FakeIdentity>,
    profiles: Arc<FakeProfiles>,
    comments: Arc<FakeComments>,
    blobs: Arc<FakeBlobs>,
) -> AppState {
    let config = SiteConfig::for_tests();
    let pool = PgPoolOptions::new()
        .connect_lazy(config.database_url.expose_secret())
        .unwrap();
    AppState::from_parts(config, pool, identity, profiles, comments, blobs)
}
