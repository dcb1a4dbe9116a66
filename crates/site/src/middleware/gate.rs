//! The session gate.
//!
//! Every request passes through [`session_gate`]. Public paths go straight
//! to their handler without touching the identity service. Other paths
//! resolve the session cookie to an identity and, for admin paths, check the
//! identity's profile for the administrator flag.
//!
//! The gate is stateless and fails closed: an unreachable identity service
//! means "not signed in" and a failed profile lookup means "not an admin".
//!
//! ```text
//!                      | no session        | session, not admin | admin
//! ---------------------+-------------------+--------------------+---------
//! /login               | proceed           | redirect /admin    | redirect /admin
//! /admin, /admin/**    | redirect /login   | 200 Access Denied  | proceed
//! /api/** (not auth)   | 401 JSON          | 403 JSON           | proceed
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::db::ProfileStore;
use crate::error::{ApiError, set_sentry_user};
use crate::filters;
use crate::models::{
    CookieUpdate, CurrentAdmin, CurrentUser, Profile, SessionCookie, SessionToken, UserIdentity,
};
use crate::services::{IdentityProvider, Resolution};
use crate::state::AppState;

/// How a path is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone; the gate does nothing.
    Public,
    /// The login page; signed-in callers are sent to the dashboard.
    LoginPage,
    /// Admin HTML pages.
    AdminPage,
    /// Admin JSON API.
    AdminApi,
}

impl Access {
    const fn needs_admin(self) -> bool {
        matches!(self, Self::AdminPage | Self::AdminApi)
    }
}

/// Segment-aware prefix match: `/admin` matches `/admin` and `/admin/x`,
/// not `/administrator`.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Classify a request path.
#[must_use]
pub fn classify(path: &str) -> Access {
    if path == "/login" {
        Access::LoginPage
    } else if under(path, "/admin") {
        Access::AdminPage
    } else if under(path, "/api/auth") {
        Access::Public
    } else if under(path, "/api") {
        // Unknown API paths are admin-only too.
        Access::AdminApi
    } else {
        Access::Public
    }
}

/// What the gate does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    RedirectToLogin,
    RedirectToAdmin,
    /// 200 page explaining the caller is not an administrator.
    AccessDenied,
    /// 401 `{"error":"Unauthorized"}`.
    Unauthorized,
    /// 403 `{"error":"Forbidden"}`.
    Forbidden,
}

/// The gate's state machine.
#[must_use]
pub const fn decide(access: Access, authenticated: bool, admin: bool) -> Decision {
    match access {
        Access::Public => Decision::Proceed,
        Access::LoginPage if authenticated => Decision::RedirectToAdmin,
        Access::LoginPage => Decision::Proceed,
        Access::AdminPage if !authenticated => Decision::RedirectToLogin,
        Access::AdminPage if !admin => Decision::AccessDenied,
        Access::AdminApi if !authenticated => Decision::Unauthorized,
        Access::AdminApi if !admin => Decision::Forbidden,
        Access::AdminPage | Access::AdminApi => Decision::Proceed,
    }
}

/// Result of running the gate over one request.
#[derive(Debug)]
pub struct GateOutcome {
    pub decision: Decision,
    pub identity: Option<UserIdentity>,
    /// Present only when the identity is an administrator.
    pub profile: Option<Profile>,
    /// The session in effect after any rotation.
    pub session: Option<SessionToken>,
    /// What to do with the browser's cookie.
    pub cookie: CookieUpdate,
}

/// Load the caller's profile. A failed lookup is logged and treated as
/// missing.
async fn load_profile(profiles: &dyn ProfileStore, identity: &UserIdentity) -> Option<Profile> {
    match profiles.get_profile_by_id(identity.id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(
                user_id = %identity.id,
                error = %e,
                "Profile lookup failed, denying admin access"
            );
            None
        }
    }
}

/// Whether a caller is an administrator. A missing profile is not.
#[must_use]
pub fn is_admin(profile: Option<&Profile>) -> bool {
    profile.is_some_and(|profile| profile.is_admin)
}

/// Resolve the session cookie, deciding what happens to the cookie.
async fn resolve_session(
    provider: &dyn IdentityProvider,
    cookie: SessionCookie,
) -> (Option<UserIdentity>, Option<SessionToken>, CookieUpdate) {
    let token = match cookie {
        SessionCookie::Absent => return (None, None, CookieUpdate::Keep),
        SessionCookie::Malformed => {
            tracing::debug!("Malformed session cookie");
            return (None, None, CookieUpdate::Clear);
        }
        SessionCookie::Present(token) => token,
    };

    match provider.resolve(&token).await {
        Ok(Some(Resolution {
            identity,
            rotated: Some(rotated),
        })) => (
            Some(identity),
            Some(rotated.clone()),
            CookieUpdate::Set(rotated),
        ),
        Ok(Some(Resolution {
            identity,
            rotated: None,
        })) => (Some(identity), Some(token), CookieUpdate::Keep),
        Ok(None) => {
            tracing::debug!("Session rejected by identity service");
            (None, None, CookieUpdate::Clear)
        }
        Err(e) => {
            // The session may still be good once the service is back.
            tracing::warn!(error = %e, "Identity service unavailable, treating request as signed out");
            (None, None, CookieUpdate::Keep)
        }
    }
}

/// Run the gate for a classified request.
pub async fn evaluate(
    provider: &dyn IdentityProvider,
    profiles: &dyn ProfileStore,
    access: Access,
    cookie: SessionCookie,
) -> GateOutcome {
    if access == Access::Public {
        return GateOutcome {
            decision: Decision::Proceed,
            identity: None,
            profile: None,
            session: None,
            cookie: CookieUpdate::Keep,
        };
    }

    let (identity, session, cookie) = resolve_session(provider, cookie).await;

    let profile = match (&identity, access.needs_admin()) {
        (Some(identity), true) => load_profile(profiles, identity).await,
        _ => None,
    };
    let admin = is_admin(profile.as_ref());

    GateOutcome {
        decision: decide(access, identity.is_some(), admin),
        identity,
        profile: profile.filter(|_| admin),
        session,
        cookie,
    }
}

/// Shown to signed-in callers who are not administrators.
#[derive(Template, WebTemplate)]
#[template(path = "access_denied.html")]
pub struct AccessDeniedTemplate;

/// Session gate middleware.
///
/// Applied with `axum::middleware::from_fn_with_state`. On success the
/// handler finds [`CurrentUser`], [`CurrentAdmin`] (admins only) and the
/// effective [`SessionToken`] in the request extensions.
pub async fn session_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let access = classify(request.uri().path());
    if access == Access::Public {
        return next.run(request).await;
    }

    let cookie = SessionCookie::from_headers(request.headers());
    let outcome = evaluate(state.identity(), state.profiles(), access, cookie);
    let GateOutcome {
        decision,
        identity,
        profile,
        session,
        cookie,
    } = outcome.await;

    tracing::debug!(
        path = %request.uri().path(),
        user_id = identity.as_ref().map(|i| i.id.to_string()),
        ?decision,
        "Session gate"
    );

    let mut response = match decision {
        Decision::Proceed => {
            if let Some(identity) = identity {
                set_sentry_user(&identity.id, identity.email.as_deref());
                let extensions = request.extensions_mut();
                extensions.insert(CurrentUser(identity.clone()));
                if let Some(profile) = profile {
                    extensions.insert(CurrentAdmin { identity, profile });
                }
            }
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            next.run(request).await
        }
        Decision::RedirectToLogin => Redirect::to("/login").into_response(),
        Decision::RedirectToAdmin => Redirect::to("/admin").into_response(),
        Decision::AccessDenied => AccessDeniedTemplate.into_response(),
        Decision::Unauthorized => ApiError::Unauthorized.into_response(),
        Decision::Forbidden => ApiError::Forbidden.into_response(),
    };

    cookie.apply(response.headers_mut(), state.config().secure_cookies());
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{
        FakeIdentity, FakeProfiles, FakeSession, admin_profile as admin_row, identity, token,
    };

    #[test]
    fn test_classify() {
        assert_eq!(classify("/"), Access::Public);
        assert_eq!(classify("/blog/hello"), Access::Public);
        assert_eq!(classify("/login"), Access::LoginPage);
        assert_eq!(classify("/login/extra"), Access::Public);
        assert_eq!(classify("/admin"), Access::AdminPage);
        assert_eq!(classify("/admin/"), Access::AdminPage);
        assert_eq!(classify("/admin/blog/3/edit"), Access::AdminPage);
        assert_eq!(classify("/administrator"), Access::Public);
        assert_eq!(classify("/api/auth/signout"), Access::Public);
        assert_eq!(classify("/api/comments/42/approve"), Access::AdminApi);
        assert_eq!(classify("/api/unknown"), Access::AdminApi);
        assert_eq!(classify("/api"), Access::AdminApi);
        assert_eq!(classify("/apiary"), Access::Public);
    }

    #[test]
    fn test_decide_matrix() {
        use Access::{AdminApi, AdminPage, LoginPage, Public};

        assert_eq!(decide(Public, false, false), Decision::Proceed);
        assert_eq!(decide(LoginPage, false, false), Decision::Proceed);
        assert_eq!(decide(LoginPage, true, false), Decision::RedirectToAdmin);
        assert_eq!(decide(LoginPage, true, true), Decision::RedirectToAdmin);
        assert_eq!(decide(AdminPage, false, false), Decision::RedirectToLogin);
        assert_eq!(decide(AdminPage, true, false), Decision::AccessDenied);
        assert_eq!(decide(AdminPage, true, true), Decision::Proceed);
        assert_eq!(decide(AdminApi, false, false), Decision::Unauthorized);
        assert_eq!(decide(AdminApi, true, false), Decision::Forbidden);
        assert_eq!(decide(AdminApi, true, true), Decision::Proceed);
    }

    #[test]
    fn test_is_admin() {
        let ada = identity("ada@example.com");
        assert!(is_admin(Some(&admin_row(&ada, true))));
        assert!(!is_admin(Some(&admin_row(&ada, false))));
        assert!(!is_admin(None));
    }

    #[tokio::test]
    async fn test_public_path_skips_identity_service() {
        let provider = FakeIdentity::default();
        let outcome = evaluate(
            &provider,
            &FakeProfiles::default(),
            Access::Public,
            SessionCookie::Present(token("anything")),
        )
        .await;

        assert_eq!(outcome.decision, Decision::Proceed);
        assert_eq!(provider.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_page_without_cookie() {
        let outcome = evaluate(
            &FakeIdentity::default(),
            &FakeProfiles::default(),
            Access::AdminPage,
            SessionCookie::Absent,
        )
        .await;

        assert_eq!(outcome.decision, Decision::RedirectToLogin);
        assert_eq!(outcome.cookie, CookieUpdate::Keep);
    }

    #[tokio::test]
    async fn test_malformed_cookie_is_cleared() {
        let outcome = evaluate(
            &FakeIdentity::default(),
            &FakeProfiles::default(),
            Access::AdminApi,
            SessionCookie::Malformed,
        )
        .await;

        assert_eq!(outcome.decision, Decision::Unauthorized);
        assert_eq!(outcome.cookie, CookieUpdate::Clear);
    }

    #[tokio::test]
    async fn test_rejected_session_is_cleared() {
        let provider = FakeIdentity::default().with("stale", FakeSession::Rejected);
        let outcome = evaluate(
            &provider,
            &FakeProfiles::default(),
            Access::AdminPage,
            SessionCookie::Present(token("stale")),
        )
        .await;

        assert_eq!(outcome.decision, Decision::RedirectToLogin);
        assert_eq!(outcome.cookie, CookieUpdate::Clear);
    }

    #[tokio::test]
    async fn test_identity_outage_fails_closed_and_keeps_cookie() {
        let ada = identity("ada@example.com");
        let provider = FakeIdentity::default().with("good", FakeSession::Outage);
        let profiles = FakeProfiles::default().with(admin_row(&ada, true));
        let outcome = evaluate(
            &provider,
            &profiles,
            Access::AdminApi,
            SessionCookie::Present(token("good")),
        )
        .await;

        assert_eq!(outcome.decision, Decision::Unauthorized);
        assert_eq!(outcome.cookie, CookieUpdate::Keep);
        assert!(outcome.identity.is_none());
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_admin() {
        let ada = identity("ada@example.com");
        let provider = FakeIdentity::default().with("good", FakeSession::Valid(ada));
        let outcome = evaluate(
            &provider,
            &FakeProfiles::default(),
            Access::AdminPage,
            SessionCookie::Present(token("good")),
        )
        .await;

        assert_eq!(outcome.decision, Decision::AccessDenied);
        assert!(outcome.profile.is_none());
    }

    #[tokio::test]
    async fn test_profile_error_is_not_admin() {
        let ada = identity("ada@example.com");
        let provider = FakeIdentity::default().with("good", FakeSession::Valid(ada.clone()));
        let profiles = FakeProfiles::default()
            .with(admin_row(&ada, true))
            .failing();
        let outcome = evaluate(
            &provider,
            &profiles,
            Access::AdminApi,
            SessionCookie::Present(token("good")),
        )
        .await;

        assert_eq!(outcome.decision, Decision::Forbidden);
    }

    #[tokio::test]
    async fn test_admin_flag_false_is_denied() {
        let ada = identity("ada@example.com");
        let provider = FakeIdentity::default().with("good", FakeSession::Valid(ada.clone()));
        let profiles = FakeProfiles::default().with(admin_row(&ada, false));
        let outcome = evaluate(
            &provider,
            &profiles,
            Access::AdminApi,
            SessionCookie::Present(token("good")),
        )
        .await;
        assert_eq!(outcome.decision, Decision::Forbidden);
    }

    #[tokio::test]
    async fn test_admin_proceeds_with_rotated_session() {
        let ada = identity("ada@example.com");
        let rotated = token("rotated");
        let provider = FakeIdentity::default().with(
            "expiring",
            FakeSession::Rotated(ada.clone(), rotated.clone()),
        );
        let profiles = FakeProfiles::default().with(admin_row(&ada, true));
        let outcome = evaluate(
            &provider,
            &profiles,
            Access::AdminPage,
            SessionCookie::Present(token("expiring")),
        )
        .await;

        assert_eq!(outcome.decision, Decision::Proceed);
        assert_eq!(outcome.identity, Some(ada));
        assert!(outcome.profile.unwrap().is_admin);
        assert_eq!(outcome.session, Some(rotated.clone()));
        assert_eq!(outcome.cookie, CookieUpdate::Set(rotated));
    }

    #[tokio::test]
    async fn test_login_page_skips_profile_lookup() {
        let ada = identity("ada@example.com");
        let provider = FakeIdentity::default().with("good", FakeSession::Valid(ada));
        let profiles = FakeProfiles::default().failing();
        let outcome = evaluate(
            &provider,
            &profiles,
            Access::LoginPage,
            SessionCookie::Present(token("good")),
        )
        .await;

        assert_eq!(outcome.decision, Decision::RedirectToAdmin);
        assert_eq!(profiles.lookups(), 0);
    }
}
