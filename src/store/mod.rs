//! Persistence contracts the identity resolver and todo orchestrator depend on.
//!
//! Implementations are chosen at startup and handed in as `Arc<dyn _>`:
//! [`crate::db::DbStore`] backs all three, [`file::FileImageStore`] is the
//! upload-directory alternative for images.

pub mod file;

use async_trait::async_trait;

use crate::error::AppError;

pub use entity::todo::Model as Todo;
pub use entity::user::Model as User;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub oauth_provider: Option<String>,
    pub oauth_provider_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub image_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub id: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UserAlreadyExists` when the email (or OAuth identity) is taken.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_oauth(&self, provider: &str, subject: &str)
        -> Result<Option<User>, AppError>;
    async fn link_oauth(&self, user_id: &str, provider: &str, subject: &str)
        -> Result<User, AppError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Newest-created first.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Todo>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, AppError>;
    async fn create(&self, todo: NewTodo) -> Result<Todo, AppError>;
    /// Persists title, description, status, image and `updated_at`.
    async fn update(&self, todo: &Todo) -> Result<Todo, AppError>;
    /// Fails with `TodoNotFound` when no row was deleted.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores the payload and returns its opaque reference.
    async fn save(&self, image: NewImage) -> Result<String, AppError>;
    async fn get(&self, id: &str) -> Result<Option<StoredImage>, AppError>;
    /// Fails with `ImageNotFound` when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Sniffs the content type from magic bytes, falling back to what the
/// client declared, then to `application/octet-stream`.
pub fn detect_content_type(data: &[u8], declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    match declared {
        Some(ct) if !ct.trim().is_empty() => ct.trim().to_string(),
        _ => DEFAULT_CONTENT_TYPE.to_string(),
    }
}
