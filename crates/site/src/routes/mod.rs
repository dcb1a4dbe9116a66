//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Public
//! GET  /                       - Home page
//! GET  /projects               - Project listing
//! GET  /projects/{id}          - Project detail
//! GET  /blog                   - Published posts
//! GET  /blog/{slug}            - Post with approved comments
//! POST /blog/{slug}/comments   - Submit a comment (rate limited)
//! GET  /contact                - Contact form
//! POST /contact                - Send a message (rate limited)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Sign in (rate limited)
//! POST /api/auth/signout       - Sign out
//!
//! # Admin pages (administrators only)
//! GET  /admin                  - Dashboard
//! GET  /admin/projects         - Projects
//! GET  /admin/projects/new     - New project form
//! POST /admin/projects/new     - Create project
//! GET  /admin/projects/{id}/edit - Edit project form
//! POST /admin/projects/{id}/edit - Update project
//! GET  /admin/blog             - Posts, drafts included
//! GET  /admin/blog/new         - New post form
//! POST /admin/blog/new         - Create post
//! GET  /admin/blog/{id}/edit   - Edit post form
//! POST /admin/blog/{id}/edit   - Update post
//! GET  /admin/comments         - Moderation queue
//! GET  /admin/messages         - Inbox
//! GET  /admin/storage          - Uploaded images
//! GET  /admin/storage/upload   - Upload form
//! POST /admin/storage/upload   - Upload an image
//!
//! # Admin API (administrators only)
//! POST /api/comments/{id}/approve
//! POST /api/comments/{id}/delete
//! POST /api/messages/{id}/mark-read
//! POST /api/messages/{id}/delete
//! POST /api/projects/{id}/delete
//! POST /api/blog/{id}/delete
//! POST /api/upload             - Upload an image, returns its public URL
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod blog;
pub mod contact;
pub mod home;
pub mod multipart;
pub mod projects;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{
    form_rate_limiter, request_id_middleware, security_headers_middleware, session_gate,
};
use crate::state::AppState;

/// Room for multipart framing and text fields around an upload.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Create all page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/projects", get(projects::index))
        .route("/projects/{id}", get(projects::show))
        .route("/blog", get(blog::index))
        .route("/blog/{slug}", get(blog::show))
        .route(
            "/blog/{slug}/comments",
            post(blog::comment).layer(form_rate_limiter()),
        )
        .route(
            "/contact",
            get(contact::page).merge(post(contact::submit).layer(form_rate_limiter())),
        )
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(form_rate_limiter())),
        )
        .nest("/admin", admin::routes())
        .nest("/api", api::routes())
}

/// Build the application: routes, health checks and the middleware stack.
///
/// Sentry layers and static files are added by the binary.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config().uploads.max_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), session_gate))
        .layer(from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, Response, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::models::{SESSION_COOKIE_NAME, SessionToken};
    use crate::testing::{
        FakeBlobs, FakeComments, FakeIdentity, FakeProfiles, FakeSession, admin_profile, identity,
        test_state, token,
    };

    const BOUNDARY: &str = "folio-test-boundary";

    struct Harness {
        identity: Arc<FakeIdentity>,
        comments: Arc<FakeComments>,
        blobs: Arc<FakeBlobs>,
        app: Router,
    }

    /// `admin-token` belongs to an administrator, `user-token` to a signed-in
    /// non-admin. Comment 42 is awaiting moderation.
    fn harness_with(identity_fake: FakeIdentity, blobs: FakeBlobs) -> Harness {
        let ada = identity("ada@example.com");
        let bob = identity("bob@example.com");
        let identity_fake = identity_fake
            .with("admin-token", FakeSession::Valid(ada.clone()))
            .with("user-token", FakeSession::Valid(bob.clone()));
        let profiles = FakeProfiles::default()
            .with(admin_profile(&ada, true))
            .with(admin_profile(&bob, false));

        let identity_fake = Arc::new(identity_fake);
        let comments = Arc::new(FakeComments::default().with_pending(42));
        let blobs = Arc::new(blobs);
        let state = test_state(
            identity_fake.clone(),
            Arc::new(profiles),
            comments.clone(),
            blobs.clone(),
        );
        Harness {
            identity: identity_fake,
            comments,
            blobs,
            app: app(state),
        }
    }

    fn harness() -> Harness {
        harness_with(FakeIdentity::default(), FakeBlobs::default())
    }

    fn session_cookie(session: &SessionToken) -> String {
        format!("{SESSION_COOKIE_NAME}={}", session.to_cookie_value())
    }

    fn get_as(uri: &str, access: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(access) = access {
            builder = builder.header(header::COOKIE, session_cookie(&token(access)));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_as(uri: &str, access: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(access) = access {
            builder = builder.header(header::COOKIE, session_cookie(&token(access)));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(format!(
                "email={}&password={password}",
                email.replace('@', "%40")
            )))
            .unwrap()
    }

    /// A multipart form post with the given text fields and an optional
    /// `(field, file name, content type, bytes)` file part.
    fn multipart_post(
        uri: &str,
        access: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &str, &[u8])>,
    ) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((field, file_name, content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, session_cookie(&token(access)))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn multipart_upload(
        access: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Request<Body> {
        let file =
            file.map(|(file_name, content_type, bytes)| ("file", file_name, content_type, bytes));
        multipart_post("/api/upload", access, fields, file)
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn set_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let response = harness()
            .app
            .oneshot(get_as("/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_security_headers_and_request_id() {
        let response = harness()
            .app
            .oneshot(get_as("/health", None))
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(
            headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
        assert!(
            headers
                .get(header::CONTENT_SECURITY_POLICY)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("https://backend.test:8443")
        );
        assert!(headers.get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_admin_without_session_redirects_to_login() {
        let h = harness();
        let response = h.app.oneshot(get_as("/admin", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert_eq!(h.identity.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_admin_as_non_admin_shows_access_denied() {
        let response = harness()
            .app
            .oneshot(get_as("/admin/blog", Some("user-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Access Denied"));
    }

    #[tokio::test]
    async fn test_api_rejections_are_json() {
        let response = harness()
            .app
            .oneshot(post_as("/api/comments/42/approve", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Unauthorized");

        let response = harness()
            .app
            .oneshot(post_as("/api/comments/42/approve", Some("user-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "Forbidden");
    }

    #[tokio::test]
    async fn test_admin_approves_comment() {
        let harness = harness();

        for _ in 0..2 {
            let response = harness
                .app
                .clone()
                .oneshot(post_as("/api/comments/42/approve", Some("admin-token")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/admin/comments");
        }
        assert_eq!(harness.comments.approved(42), Some(true));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_approve_comment() {
        let harness = harness();
        let response = harness
            .app
            .oneshot(post_as("/api/comments/42/approve", Some("user-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(harness.comments.approved(42), Some(false));
    }

    #[tokio::test]
    async fn test_moderating_missing_comment_still_redirects() {
        let harness = harness();
        let response = harness
            .app
            .clone()
            .oneshot(post_as("/api/comments/7/approve", Some("admin-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = harness
            .app
            .clone()
            .oneshot(post_as("/api/comments/42/delete", Some("admin-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(harness.comments.approved(42), None);

        let response = harness
            .app
            .oneshot(post_as("/api/comments/42/delete", Some("admin-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/comments");
    }

    #[tokio::test]
    async fn test_malformed_api_id_is_json() {
        let response = harness()
            .app
            .oneshot(post_as("/api/comments/abc/approve", Some("admin-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let json = body_json(response).await;
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("abc"), "{error}");
    }

    #[tokio::test]
    async fn test_login_page() {
        let response = harness().app.oneshot(get_as("/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = harness()
            .app
            .oneshot(get_as("/login", Some("user-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let h = harness_with(
            FakeIdentity::default().with_credentials("ada@example.com", "hunter2", token("fresh")),
            FakeBlobs::default(),
        );
        let response = h
            .app
            .oneshot(login_request("ada@example.com", "hunter2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with(&format!("{SESSION_COOKIE_NAME}=")));
        assert!(cookies[0].contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let h = harness_with(
            FakeIdentity::default().with_credentials("ada@example.com", "hunter2", token("fresh")),
            FakeBlobs::default(),
        );
        let response = h
            .app
            .oneshot(login_request("ada@example.com", "wrong"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
        assert!(body_text(response).await.contains("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_cookie() {
        let h = harness();
        let response = h
            .app
            .oneshot(post_as("/api/auth/signout", Some("user-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains("Max-Age=0"));
        assert_eq!(h.identity.signed_out(), vec!["user-token".to_string()]);
    }

    #[tokio::test]
    async fn test_admin_storage_lists_objects() {
        let h = harness_with(
            FakeIdentity::default(),
            FakeBlobs::default().with_object("images", "public/cat.png"),
        );
        let response = h
            .app
            .oneshot(get_as("/admin/storage", Some("admin-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());
        assert!(body_text(response).await.contains("public/cat.png"));
    }

    #[tokio::test]
    async fn test_rotated_session_is_written_back() {
        let h = harness_with(
            FakeIdentity::default().with(
                "stale-token",
                FakeSession::Rotated(identity("carol@example.com"), token("rotated")),
            ),
            FakeBlobs::default(),
        );
        let response = h
            .app
            .oneshot(get_as("/admin", Some("stale-token")))
            .await
            .unwrap();
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains(&token("rotated").to_cookie_value()));
    }

    #[tokio::test]
    async fn test_identity_outage_keeps_cookie() {
        let h = harness_with(
            FakeIdentity::default().with("flaky-token", FakeSession::Outage),
            FakeBlobs::default(),
        );
        let response = h
            .app
            .oneshot(get_as("/admin", Some("flaky-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_cookie_is_cleared() {
        let request = Request::builder()
            .uri("/admin")
            .header(
                header::COOKIE,
                format!("{SESSION_COOKIE_NAME}=not-a-session"),
            )
            .body(Body::empty())
            .unwrap();
        let response = harness().app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_lookalike_path_is_public() {
        let h = harness();
        let response = h
            .app
            .oneshot(get_as("/administrator", Some("user-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(h.identity.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let h = harness();
        let response = h
            .app
            .oneshot(multipart_upload(
                "admin-token",
                &[("bucket", "images"), ("folder", "blog")],
                Some(("cat.png", "image/png", b"\x89PNG fake")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        let url = json["publicUrl"].as_str().unwrap();
        assert!(url.starts_with("https://backend.test:8443/storage/v1/object/public/images/blog/"));
        assert!(url.ends_with(".png"));

        let uploads = h.blobs.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].bucket, "images");
        assert_eq!(uploads[0].content_type, "image/png");
        assert_eq!(uploads[0].access_token, "admin-token");
    }

    #[tokio::test]
    async fn test_upload_requires_file_and_bucket() {
        let response = harness()
            .app
            .oneshot(multipart_upload("admin-token", &[("bucket", "images")], None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "File and bucket are required"
        );

        let response = harness()
            .app
            .oneshot(multipart_upload(
                "admin-token",
                &[],
                Some(("cat.png", "image/png", b"data")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let h = harness();
        let response = h
            .app
            .oneshot(multipart_upload(
                "admin-token",
                &[("bucket", "images")],
                Some(("cv.pdf", "application/pdf", b"%PDF-1.7")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Unsupported file type: application/pdf"
        );
        assert!(h.blobs.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_upload_storage_failure() {
        let h = harness_with(FakeIdentity::default(), FakeBlobs::default().failing());
        let response = h
            .app
            .oneshot(multipart_upload(
                "admin-token",
                &[("bucket", "images")],
                Some(("cat.png", "image/png", b"data")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        let error = json["error"].as_str().unwrap();
        assert!(error.starts_with("Error uploading file:"));
    }

    #[tokio::test]
    async fn test_upload_forbidden_for_non_admin() {
        let h = harness();
        let response = h
            .app
            .oneshot(multipart_upload(
                "user-token",
                &[("bucket", "images")],
                Some(("cat.png", "image/png", b"data")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(h.blobs.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_post_form_uploads_nothing() {
        let h = harness();
        let response = h
            .app
            .oneshot(multipart_post(
                "/admin/blog/new",
                "admin-token",
                &[("title", " "), ("content", "Body")],
                Some(("thumbnail_file", "cat.png", "image/png", b"\x89PNG fake")),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Title is required"));
        assert!(h.blobs.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_project_form_uploads_nothing() {
        let h = harness();
        let response = h
            .app
            .oneshot(multipart_post(
                "/admin/projects/new",
                "admin-token",
                &[("title", "Folio")],
                Some(("image_file", "shot.webp", "image/webp", b"RIFF fake")),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Short description is required"));
        assert!(h.blobs.uploads().is_empty());
    }
}
