//! Sign-in and sign-out.
//!
//! Credentials are checked by the identity service; the site only stores the
//! resulting session in the `folio_session` cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{add_breadcrumb, clear_sentry_user};
use crate::filters;
use crate::models::{CookieUpdate, SessionCookie};
use crate::services::IdentityError;
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

fn login_error(status: StatusCode, email: String, message: &str) -> Response {
    (
        status,
        LoginTemplate {
            email,
            error: Some(message.to_string()),
        },
    )
        .into_response()
}

/// Display the login page.
///
/// The session gate has already sent signed-in callers to `/admin`.
pub async fn login_page() -> LoginTemplate {
    LoginTemplate {
        email: String::new(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip(state, form), fields(email = %form.email.trim()))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let email = form.email.trim().to_string();
    if email.is_empty() || form.password.is_empty() {
        return login_error(
            StatusCode::BAD_REQUEST,
            email,
            "Email and password are required",
        );
    }

    let password = SecretString::from(form.password);
    match state
        .identity()
        .sign_in_with_password(&email, &password)
        .await
    {
        Ok(session) => {
            tracing::info!("Signed in");
            add_breadcrumb("auth", "Signed in", None);
            let mut response = Redirect::to("/admin").into_response();
            CookieUpdate::Set(session)
                .apply(response.headers_mut(), state.config().secure_cookies());
            response
        }
        Err(IdentityError::InvalidCredentials) => {
            tracing::info!("Sign-in rejected");
            login_error(StatusCode::UNAUTHORIZED, email, "Invalid email or password")
        }
        Err(e) => {
            tracing::error!(error = %e, "Sign-in failed");
            login_error(
                StatusCode::BAD_GATEWAY,
                email,
                "Sign-in is unavailable right now. Please try again later.",
            )
        }
    }
}

/// Sign out: revoke the session if possible, always clear the cookie.
#[instrument(skip_all)]
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session) = SessionCookie::from_headers(&headers).token()
        && let Err(e) = state.identity().sign_out(&session).await
    {
        tracing::warn!(error = %e, "Could not revoke session");
    }
    clear_sentry_user();

    let mut response = Redirect::to("/login").into_response();
    CookieUpdate::Clear.apply(response.headers_mut(), state.config().secure_cookies());
    response
}
