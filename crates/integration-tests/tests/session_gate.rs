//! Session gate behavior against a running server.
//!
//! These tests require the site running (cargo run -p folio-site) with a
//! reachable identity service.

use folio_integration_tests::{admin_credentials, base_url, client};
use reqwest::{StatusCode, header};
use serde_json::Value;

fn location(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_public_pages_render() {
    let client = client().expect("Failed to create HTTP client");
    for path in ["/", "/projects", "/blog", "/contact", "/login"] {
        let resp = client
            .get(format!("{}{path}", base_url()))
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), StatusCode::OK, "GET {path}");
        assert!(
            resp.headers().contains_key(header::CONTENT_SECURITY_POLICY),
            "GET {path} is missing a CSP"
        );
    }
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_admin_redirects_anonymous_to_login() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .get(format!("{}/admin/blog", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_api_rejects_anonymous_with_json() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .post(format!("{}/api/comments/1/approve", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("Expected a JSON body");
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_lookalike_admin_path_is_not_gated() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .get(format!("{}/administrator", base_url()))
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_garbage_cookie_is_cleared() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .get(format!("{}/admin", base_url()))
        .header(header::COOKIE, "folio_session=garbage")
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let cleared = resp
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("folio_session=") && v.contains("Max-Age=0"));
    assert!(cleared, "Expected the session cookie to be removed");
}

#[tokio::test]
#[ignore = "Requires running server and identity service"]
async fn test_login_with_wrong_password() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .post(format!("{}/login", base_url()))
        .form(&[("email", "nobody@example.com"), ("password", "wrong")])
        .send()
        .await
        .expect("Failed to reach server");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(
        resp.text()
            .await
            .expect("Failed to read body")
            .contains("Invalid email or password")
    );
}

#[tokio::test]
#[ignore = "Requires running server, identity service and admin credentials"]
async fn test_admin_sign_in_and_out() {
    let Some((email, password)) = admin_credentials() else {
        return;
    };
    let client = client().expect("Failed to create HTTP client");
    let base_url = base_url();

    let resp = client
        .post(format!("{base_url}/login"))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .expect("Failed to sign in");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/admin"));

    let resp = client
        .get(format!("{base_url}/admin"))
        .send()
        .await
        .expect("Failed to load dashboard");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("Failed to read body").contains("Welcome back"));

    // Signed in, the login page sends us to the dashboard
    let resp = client
        .get(format!("{base_url}/login"))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(location(&resp), Some("/admin"));

    let resp = client
        .post(format!("{base_url}/api/auth/signout"))
        .send()
        .await
        .expect("Failed to sign out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));

    let resp = client
        .get(format!("{base_url}/admin"))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(location(&resp), Some("/login"));
}
