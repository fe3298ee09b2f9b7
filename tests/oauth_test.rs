mod common;

use axum::http::StatusCode;
use common::{TestApp, FRONTEND_URL, PASSWORD};
use serial_test::serial;

const FAILED: &str = "http://frontend.test/login?error=oauth_failed";

async fn begin_state(app: &TestApp) -> String {
    let resp = app.get("/auth/test", None).await;
    resp.assert_status(StatusCode::SEE_OTHER);

    let location = resp.location();
    let state = location
        .strip_prefix("https://provider.test/authorize?state=")
        .unwrap_or_else(|| panic!("Unexpected authorize URL: {location}"));
    state.to_string()
}

/// Runs the full redirect round trip and returns the frontend redirect target.
async fn callback(app: &TestApp, code: &str) -> String {
    let state = begin_state(app).await;
    let resp = app
        .get(&format!("/auth/test/callback?code={code}&state={state}"), None)
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    resp.location()
}

fn token_from(location: &str) -> String {
    location
        .strip_prefix(&format!("{FRONTEND_URL}/callback?token="))
        .unwrap_or_else(|| panic!("Expected token redirect, got {location}"))
        .to_string()
}

// ─── Redirect flow ───────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn oauth_round_trip_creates_user() {
    let app = TestApp::new().await;
    app.provider
        .add_code("code-1", "sub-1", Some("oauth@test.com"), Some("OAuth User"));

    let token = token_from(&callback(&app, "code-1").await);

    let resp = app.get("/me", Some(&token)).await;
    resp.assert_status(StatusCode::OK);
    let me: serde_json::Value = resp.json();
    assert_eq!(me["email"], "oauth@test.com");
    assert_eq!(me["username"], "OAuth User");
    assert_eq!(me["oauth_provider"], "test");
    assert_eq!(me["oauth_provider_id"], "sub-1");
}

#[serial]
#[tokio::test]
async fn repeated_oauth_login_resolves_same_user() {
    let app = TestApp::new().await;
    app.provider
        .add_code("code-1", "sub-1", Some("oauth@test.com"), None);

    let first = app
        .state
        .jwt
        .verify(&token_from(&callback(&app, "code-1").await))
        .unwrap();
    let second = app
        .state
        .jwt
        .verify(&token_from(&callback(&app, "code-1").await))
        .unwrap();

    assert_eq!(first.user_id, second.user_id);
}

#[serial]
#[tokio::test]
async fn username_falls_back_to_email_local_part() {
    let app = TestApp::new().await;
    app.provider
        .add_code("code-1", "sub-1", Some("nameless@test.com"), None);

    let token = token_from(&callback(&app, "code-1").await);
    let me: serde_json::Value = app.get("/me", Some(&token)).await.json();
    assert_eq!(me["username"], "nameless");
}

#[serial]
#[tokio::test]
async fn oauth_login_links_existing_password_account() {
    let app = TestApp::new().await;
    let (user_id, _) = app.signup_user("alice").await;
    app.provider
        .add_code("code-1", "sub-alice", Some("alice@test.com"), Some("Alice"));

    let token = token_from(&callback(&app, "code-1").await);
    let claims = app.state.jwt.verify(&token).unwrap();
    assert_eq!(claims.user_id, user_id);

    // The password still works after linking.
    app.login("alice@test.com", PASSWORD)
        .await
        .assert_status(StatusCode::OK);

    let me: serde_json::Value = app.get("/me", Some(&token)).await.json();
    assert_eq!(me["username"], "alice");
    assert_eq!(me["oauth_provider_id"], "sub-alice");
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn unknown_provider_is_not_found() {
    let app = TestApp::new().await;

    let resp = app.get("/auth/nope", None).await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let json: serde_json::Value = resp.json();
    assert_eq!(json["error"], "provider_not_supported");

    let resp = app.get("/auth/nope/callback?code=x&state=y", None).await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), FAILED);
}

#[serial]
#[tokio::test]
async fn callback_with_bad_state_fails() {
    let app = TestApp::new().await;
    app.provider
        .add_code("code-1", "sub-1", Some("oauth@test.com"), None);

    for uri in [
        "/auth/test/callback?code=code-1",
        "/auth/test/callback?code=code-1&state=forged",
    ] {
        let resp = app.get(uri, None).await;
        resp.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(resp.location(), FAILED);
    }
}

#[serial]
#[tokio::test]
async fn callback_with_unknown_code_fails() {
    let app = TestApp::new().await;
    assert_eq!(callback(&app, "never-issued").await, FAILED);
}

#[serial]
#[tokio::test]
async fn callback_with_provider_error_fails() {
    let app = TestApp::new().await;
    let state = begin_state(&app).await;

    let resp = app
        .get(
            &format!("/auth/test/callback?error=access_denied&state={state}"),
            None,
        )
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), FAILED);
}

#[serial]
#[tokio::test]
async fn new_identity_without_email_fails() {
    let app = TestApp::new().await;
    app.provider.add_code("code-1", "sub-1", None, Some("No Email"));

    assert_eq!(callback(&app, "code-1").await, FAILED);
}

#[serial]
#[tokio::test]
async fn known_identity_without_email_still_logs_in() {
    let app = TestApp::new().await;
    app.provider
        .add_code("first", "sub-1", Some("oauth@test.com"), None);
    app.provider.add_code("second", "sub-1", None, None);

    let first = token_from(&callback(&app, "first").await);
    let second = token_from(&callback(&app, "second").await);

    assert_eq!(
        app.state.jwt.verify(&first).unwrap().user_id,
        app.state.jwt.verify(&second).unwrap().user_id
    );
}
