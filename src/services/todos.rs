use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::AppError;
use crate::store::{detect_content_type, ImageStore, NewImage, NewTodo, Todo, TodoStore};

pub const DEFAULT_STATUS: &str = "pending";

/// Title, description and status as sent by the client. Absent fields are empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TodoRequest {
    pub title: String,
    pub description: String,
    pub status: String,
}

/// An image payload attached to a create or update request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Owns the todo lifecycle: ownership checks, and keeping todos and their
/// images consistent across two stores that share no transaction.
///
/// Images are stored before a todo points at them and old images are only
/// removed once the replacement is stored. Cleanup after a partial failure is
/// best-effort: failures are logged and never change the caller's result.
#[derive(Clone)]
pub struct TodoService {
    todos: Arc<dyn TodoStore>,
    images: Arc<dyn ImageStore>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoStore>, images: Arc<dyn ImageStore>) -> Self {
        Self { todos, images }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Todo>, AppError> {
        self.todos.list_by_user(user_id).await
    }

    pub async fn get(&self, todo_id: &str, user_id: &str) -> Result<Todo, AppError> {
        let todo = self
            .todos
            .find_by_id(todo_id)
            .await?
            .ok_or(AppError::TodoNotFound)?;

        if todo.user_id != user_id {
            tracing::debug!(todo_id, user_id, "Rejected access to another user's todo");
            return Err(AppError::NotOwner);
        }

        Ok(todo)
    }

    pub async fn create(
        &self,
        req: TodoRequest,
        user_id: &str,
        image: Option<ImageUpload>,
    ) -> Result<Todo, AppError> {
        let (title, status) = validate(&req)?;

        let image_id = match image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        let created = self
            .todos
            .create(NewTodo {
                user_id: user_id.to_string(),
                title,
                description: req.description,
                status,
                image_id: image_id.clone(),
            })
            .await;

        match created {
            Ok(todo) => {
                tracing::info!(todo_id = %todo.id, user_id, "Created todo");
                Ok(todo)
            }
            Err(e) => {
                if let Some(id) = image_id {
                    self.discard_image(&id, "todo insert failed").await;
                }
                Err(e)
            }
        }
    }

    /// Overwrites title, description and status (no partial updates). A new
    /// image replaces the old one, which is deleted best-effort.
    pub async fn update(
        &self,
        todo_id: &str,
        req: TodoRequest,
        user_id: &str,
        image: Option<ImageUpload>,
    ) -> Result<Todo, AppError> {
        let mut todo = self.get(todo_id, user_id).await?;
        let (title, status) = validate(&req)?;

        todo.title = title;
        todo.description = req.description;
        todo.status = status;
        todo.updated_at = chrono::Utc::now().naive_utc();

        let new_image_id = match image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };

        if let Some(new_id) = &new_image_id {
            if let Some(old_id) = todo.image_id.replace(new_id.clone()) {
                self.discard_image(&old_id, "replaced by a new image").await;
            }
        }

        match self.todos.update(&todo).await {
            Ok(updated) => {
                tracing::info!(todo_id, user_id, "Updated todo");
                Ok(updated)
            }
            Err(e) => {
                if let Some(id) = new_image_id {
                    self.discard_image(&id, "todo update failed").await;
                }
                Err(e)
            }
        }
    }

    pub async fn delete(&self, todo_id: &str, user_id: &str) -> Result<(), AppError> {
        let todo = self.get(todo_id, user_id).await?;

        if let Some(image_id) = &todo.image_id {
            self.discard_image(image_id, "todo deleted").await;
        }

        self.todos.delete(&todo.id).await?;
        tracing::info!(todo_id, user_id, "Deleted todo");
        Ok(())
    }

    async fn store_image(&self, upload: ImageUpload) -> Result<String, AppError> {
        let content_type = detect_content_type(&upload.data, upload.content_type.as_deref());
        let base = Path::new(&upload.filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("image");

        self.images
            .save(NewImage {
                filename: format!("{}_{}", chrono::Utc::now().timestamp(), base),
                content_type,
                data: upload.data,
            })
            .await
    }

    async fn discard_image(&self, image_id: &str, reason: &str) {
        if let Err(e) = self.images.delete(image_id).await {
            tracing::warn!(
                image_id,
                reason,
                error = %e,
                "Image cleanup failed; image may be orphaned"
            );
        }
    }
}

/// Title must be non-empty; an empty status becomes `pending`.
fn validate(req: &TodoRequest) -> Result<(String, String), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let status = match req.status.trim() {
        "" => DEFAULT_STATUS.to_string(),
        s => s.to_string(),
    };

    Ok((req.title.clone(), status))
}
