//! Session token carried in the `folio_session` cookie.
//!
//! The hosted identity service issues an access token (short-lived) and a
//! refresh token. Both travel together in one cookie as base64url-encoded
//! JSON. The site never stores sessions itself.

use axum::http::{HeaderMap, HeaderValue, header};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "folio_session";

/// Session cookie lifetime in seconds (7 days).
pub const SESSION_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Tokens issued by the identity service for one signed-in browser.
///
/// Implements `Debug` manually to redact both tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token expires.
    pub expires_at: i64,
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl SessionToken {
    /// Decode a cookie value. Returns `None` for anything malformed.
    #[must_use]
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
        let token: Self = serde_json::from_slice(&bytes).ok()?;
        if token.access_token.is_empty() || token.refresh_token.is_empty() {
            return None;
        }
        Some(token)
    }

    /// Encode into a cookie value.
    #[must_use]
    pub fn to_cookie_value(&self) -> String {
        // Serializing two strings and an integer cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Whether the access token expires within `leeway_seconds` of `now`.
    #[must_use]
    pub const fn expires_within(&self, now: i64, leeway_seconds: i64) -> bool {
        self.expires_at <= now + leeway_seconds
    }
}

/// What the incoming request carried in its `Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCookie {
    /// No session cookie at all.
    Absent,
    /// A session cookie that does not decode.
    Malformed,
    /// A decoded session.
    Present(SessionToken),
}

impl SessionCookie {
    /// Read the session cookie from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let value = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == SESSION_COOKIE_NAME)
            .map(|c| c.value().to_owned());

        match value {
            None => Self::Absent,
            Some(v) => SessionToken::from_cookie_value(&v).map_or(Self::Malformed, Self::Present),
        }
    }

    /// The decoded token, if any.
    #[must_use]
    pub fn token(self) -> Option<SessionToken> {
        match self {
            Self::Present(token) => Some(token),
            Self::Absent | Self::Malformed => None,
        }
    }
}

/// How a response should change the browser's session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    /// Leave the cookie alone.
    Keep,
    /// Replace the cookie with a new (rotated or freshly issued) session.
    Set(SessionToken),
    /// Remove the cookie.
    Clear,
}

impl CookieUpdate {
    /// Append the matching `Set-Cookie` header to a response.
    ///
    /// A response that already sets the session cookie is left untouched so
    /// that a handler's own decision (sign-in, sign-out) wins.
    pub fn apply(&self, headers: &mut HeaderMap, secure: bool) {
        let cookie = match self {
            Self::Keep => return,
            Self::Set(token) => session_cookie(token, secure),
            Self::Clear => removal_cookie(secure),
        };
        if sets_session_cookie(headers) {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            headers.append(header::SET_COOKIE, value);
        }
    }
}

/// Build the session cookie for a token.
#[must_use]
pub fn session_cookie(token: &SessionToken, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_cookie_value()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(cookie::time::Duration::seconds(SESSION_MAX_AGE_SECONDS))
        .build()
}

/// Build a cookie that removes the session cookie.
#[must_use]
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

fn sets_session_cookie(headers: &HeaderMap) -> bool {
    let prefix = format!("{SESSION_COOKIE_NAME}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
