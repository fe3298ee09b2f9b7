#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use todo_service::auth::providers::{OAuthProvider, OAuthProviders, ProviderUserInfo};
use todo_service::config::{Config, ImageStorage};
use todo_service::error::AppError;
use todo_service::routes::create_router;
use todo_service::AppState;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const FRONTEND_URL: &str = "http://frontend.test";
pub const PASSWORD: &str = "Password1!";

// ─── StubProvider ────────────────────────────────────────────────────────────

/// Identity provider for tests: authorization codes are registered up front
/// and exchanged for the matching identity.
#[derive(Default)]
pub struct StubProvider {
    identities: Mutex<HashMap<String, ProviderUserInfo>>,
}

impl StubProvider {
    pub fn add_code(&self, code: &str, subject: &str, email: Option<&str>, name: Option<&str>) {
        self.identities.lock().unwrap().insert(
            code.to_string(),
            ProviderUserInfo {
                subject: subject.to_string(),
                email: email.map(str::to_string),
                name: name.map(str::to_string),
            },
        );
    }
}

#[async_trait]
impl OAuthProvider for StubProvider {
    fn provider_id(&self) -> &str {
        "test"
    }

    fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        Ok(format!("https://provider.test/authorize?state={state}"))
    }

    async fn exchange(&self, code: &str) -> Result<ProviderUserInfo, AppError> {
        self.identities
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::BadRequest("unknown code".to_string()))
    }
}

// ─── TestResponse ────────────────────────────────────────────────────────────

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body_bytes: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body_bytes).to_string()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body_bytes).unwrap_or_else(|e| {
            panic!(
                "Failed to deserialize response as {}: {e}\nBody: {}",
                std::any::type_name::<T>(),
                self.text()
            )
        })
    }

    pub fn header(&self, name: header::HeaderName) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }

    pub fn location(&self) -> String {
        self.header(header::LOCATION)
            .unwrap_or_else(|| panic!("No Location header. Status: {}", self.status))
    }

    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status, expected,
            "Expected status {expected}, got {}. Body: {}",
            self.status,
            self.text()
        );
    }
}

// ─── Multipart ───────────────────────────────────────────────────────────────

pub const BOUNDARY: &str = "----todo-service-test-boundary";

/// Builds a `multipart/form-data` body from text fields and an optional
/// `image` file part `(filename, content_type, bytes)`.
pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Smallest valid PNG header, enough for content sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
];

// ─── TestApp ─────────────────────────────────────────────────────────────────

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub provider: Arc<StubProvider>,
    upload_dir: PathBuf,
}

pub fn test_config(image_storage: ImageStorage, upload_dir: PathBuf) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        frontend_url: FRONTEND_URL.to_string(),
        allowed_origins: vec![FRONTEND_URL.to_string()],
        image_storage,
        upload_dir,
        google_client_id: String::new(),
        google_client_secret: String::new(),
        oauth_callback_url: "http://localhost/auth/test/callback".to_string(),
        session_secret: "test-session-secret".to_string(),
        request_timeout_secs: 30,
        max_upload_bytes: 1 << 20,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_storage(ImageStorage::Database).await
    }

    pub async fn with_storage(image_storage: ImageStorage) -> Self {
        let upload_dir =
            std::env::temp_dir().join(format!("todo-service-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(image_storage, upload_dir.clone());

        let db = todo_service::db::pool::connect(&config.database_url)
            .await
            .expect("Failed to connect to in-memory SQLite");

        todo_service::db::migration::run(&db)
            .await
            .expect("Failed to run migrations");

        let provider = Arc::new(StubProvider::default());
        let mut oauth = OAuthProviders::new();
        oauth.register(provider.clone());

        let state = AppState::with_database(config, db, oauth)
            .await
            .expect("Failed to build app state");

        let router = create_router(state.clone());

        Self {
            router,
            state,
            provider,
            upload_dir,
        }
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    pub async fn request(&self, req: Request<Body>) -> TestResponse {
        let resp = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("oneshot failed");

        let status = resp.status();
        let headers = resp.headers().clone();
        let body_bytes = resp
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body_bytes,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.request(req).await
    }

    pub async fn send_multipart(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: Vec<u8>,
    ) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .unwrap();
        self.request(req).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        let req = Request::builder()
            .method("DELETE")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    // ── Auth helpers ─────────────────────────────────────────────────────

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> TestResponse {
        self.send_json(
            "POST",
            "/signup",
            None,
            serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.send_json(
            "POST",
            "/login",
            None,
            serde_json::json!({
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    /// Signs up a user and returns `(user_id, token)`.
    pub async fn signup_user(&self, username: &str) -> (String, String) {
        let resp = self
            .signup(username, &format!("{username}@test.com"), PASSWORD)
            .await;
        resp.assert_status(StatusCode::CREATED);

        let json: serde_json::Value = resp.json();
        (
            json["user"]["id"].as_str().unwrap().to_string(),
            json["token"].as_str().unwrap().to_string(),
        )
    }

    // ── Todo helpers ─────────────────────────────────────────────────────

    pub async fn create_todo(&self, token: &str, title: &str) -> serde_json::Value {
        let resp = self
            .send_json(
                "POST",
                "/todos",
                Some(token),
                serde_json::json!({ "title": title, "description": "desc" }),
            )
            .await;
        resp.assert_status(StatusCode::CREATED);
        resp.json()
    }

    pub async fn create_todo_with_image(&self, token: &str, title: &str) -> serde_json::Value {
        let body = multipart_body(
            &[("title", title), ("status", "pending")],
            Some(("photo.png", "image/png", PNG_BYTES)),
        );
        let resp = self.send_multipart("POST", "/todos", token, body).await;
        resp.assert_status(StatusCode::CREATED);
        resp.json()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}
