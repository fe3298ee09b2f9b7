use async_trait::async_trait;
use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        FromRequest, Path, Request, State,
    },
    http::{header, StatusCode},
    Json,
};
use serde::Serialize;

use crate::auth::middleware::AuthenticatedUser;
use crate::error::AppError;
use crate::services::{ImageUpload, TodoRequest};
use crate::store::Todo;
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    /// Id to fetch via `GET /images/{id}`; empty when the todo has no image.
    pub image_reference: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            user_id: todo.user_id,
            title: todo.title,
            description: todo.description,
            status: todo.status,
            image_reference: todo.image_id.unwrap_or_default(),
            created_at: todo.created_at.to_string(),
            updated_at: todo.updated_at.to_string(),
        }
    }
}

/// A create/update body: JSON, or `multipart/form-data` with an optional
/// `image` file part.
#[derive(Debug)]
pub struct TodoPayload {
    pub request: TodoRequest,
    pub image: Option<ImageUpload>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(e.body_text())
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<TodoPayload, AppError> {
    let mut request = TodoRequest::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => request.title = field.text().await.map_err(multipart_error)?,
            "description" => request.description = field.text().await.map_err(multipart_error)?,
            "status" => request.status = field.text().await.map_err(multipart_error)?,
            "image" => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was chosen.
                if !data.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(TodoPayload { request, image })
}

#[async_trait]
impl<S> FromRequest<S> for TodoPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return read_multipart(multipart).await;
        }

        let Json(request) = Json::<TodoRequest>::from_request(req, state)
            .await
            .map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge
                } else {
                    AppError::BadRequest(e.body_text())
                }
            })?;

        Ok(TodoPayload {
            request,
            image: None,
        })
    }
}

// --- Handlers ---

pub async fn list(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = state.todos.list(&user.user_id).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

pub async fn create(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    payload: TodoPayload,
) -> Result<(StatusCode, Json<TodoResponse>), AppError> {
    let todo = state
        .todos
        .create(payload.request, &user.user_id, payload.image)
        .await?;

    Ok((StatusCode::CREATED, Json(todo.into())))
}

pub async fn get(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = state.todos.get(&id, &user.user_id).await?;
    Ok(Json(todo.into()))
}

pub async fn update(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: TodoPayload,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = state
        .todos
        .update(&id, payload.request, &user.user_id, payload.image)
        .await?;

    Ok(Json(todo.into()))
}

pub async fn delete(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.todos.delete(&id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
