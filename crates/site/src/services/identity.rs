//! Hosted identity service client.
//!
//! The identity service owns users and sessions. The site only exchanges a
//! session token for an identity, refreshing the token when it is about to
//! expire, and never caches the answer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use folio_core::UserId;

use crate::config::BackendConfig;
use crate::models::{SessionToken, UserIdentity};

/// Refresh access tokens that expire within this many seconds.
pub const REFRESH_LEEWAY_SECONDS: i64 = 60;

/// Lifetime assumed when the service reports no expiry.
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Email and password did not match.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The service answered with an unexpected status.
    #[error("identity service error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service answered with a body we could not read.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A session resolved to an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identity: UserIdentity,
    /// Set when the session had to be refreshed; the browser must get it.
    pub rotated: Option<SessionToken>,
}

/// Identity service operations used by the site.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a session token for the identity it belongs to.
    ///
    /// Returns `Ok(None)` when the service rejects the session, and `Err`
    /// when the service could not be asked (transport failure, 5xx).
    async fn resolve(&self, token: &SessionToken) -> Result<Option<Resolution>, IdentityError>;

    /// Start a session with email and password.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionToken, IdentityError>;

    /// Revoke a session.
    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityError>;
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserPayload> for UserIdentity {
    fn from(user: UserPayload) -> Self {
        Self {
            id: UserId::new(user.id),
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<UserPayload>,
}

impl TokenResponse {
    fn into_parts(self, now: i64) -> (SessionToken, Option<UserIdentity>) {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now + secs))
            .unwrap_or(now + DEFAULT_TOKEN_TTL_SECONDS);
        let token = SessionToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        };
        (token, self.user.map(UserIdentity::from))
    }
}

/// Status codes with which the service refuses a token or grant.
const fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
    )
}

/// [`IdentityProvider`] over the hosted service's REST API.
#[derive(Clone)]
pub struct HostedIdentityClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

impl HostedIdentityClient {
    /// Create a new identity client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Look up the user behind an access token.
    ///
    /// `Ok(None)` means the service refused the token.
    async fn fetch_user(&self, access_token: &str) -> Result<Option<UserIdentity>, IdentityError> {
        let response = self
            .client
            .get(self.url("user"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();

        if is_rejection(status) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message: super::error_message(response).await,
            });
        }

        let user: UserPayload = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        Ok(Some(user.into()))
    }

    /// Trade a refresh token for a new session.
    ///
    /// `Ok(None)` means the service refused the refresh token.
    async fn refresh(&self, token: &SessionToken) -> Result<Option<Resolution>, IdentityError> {
        let response = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({ "refresh_token": token.refresh_token }))
            .send()
            .await?;
        let status = response.status();

        if is_rejection(status) {
            tracing::debug!(status = status.as_u16(), "Session refresh rejected");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message: super::error_message(response).await,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        let (rotated, user) = body.into_parts(chrono::Utc::now().timestamp());

        let identity = match user {
            Some(identity) => identity,
            None => match self.fetch_user(&rotated.access_token).await? {
                Some(identity) => identity,
                None => return Ok(None),
            },
        };

        tracing::debug!(user_id = %identity.id, "Session refreshed");
        Ok(Some(Resolution {
            identity,
            rotated: Some(rotated),
        }))
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityClient {
    async fn resolve(&self, token: &SessionToken) -> Result<Option<Resolution>, IdentityError> {
        let now = chrono::Utc::now().timestamp();
        if token.expires_within(now, REFRESH_LEEWAY_SECONDS) {
            return self.refresh(token).await;
        }

        match self.fetch_user(&token.access_token).await? {
            Some(identity) => Ok(Some(Resolution {
                identity,
                rotated: None,
            })),
            // The service may have revoked the access token early.
            None => self.refresh(token).await,
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SessionToken, IdentityError> {
        let response = self
            .client
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&serde_json::json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await?;
        let status = response.status();

        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message: super::error_message(response).await,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        Ok(body.into_parts(chrono::Utc::now().timestamp()).0)
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.url("logout"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let status = response.status();

        // A session that is already gone counts as signed out.
        if status.is_success() || is_rejection(status) {
            return Ok(());
        }
        Err(IdentityError::Api {
            status: status.as_u16(),
            message: super::error_message(response).await,
        })
    }
}
