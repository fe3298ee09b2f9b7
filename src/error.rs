use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    /// The todo exists but belongs to another user. Rendered exactly like
    /// `TodoNotFound` so callers cannot probe for other users' ids.
    #[error("Todo belongs to another user")]
    NotOwner,

    #[error("Todo not found")]
    TodoNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Image not found")]
    ImageNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Provider not supported: {0}")]
    ProviderNotSupported(String),

    #[error("Invalid OAuth state")]
    InvalidOAuthState,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", self.to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", self.to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::NotOwner | AppError::TodoNotFound => (
                StatusCode::NOT_FOUND,
                "todo_not_found",
                AppError::TodoNotFound.to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::ImageNotFound => {
                (StatusCode::NOT_FOUND, "image_not_found", self.to_string())
            }
            AppError::UserAlreadyExists => {
                (StatusCode::CONFLICT, "user_already_exists", self.to_string())
            }
            AppError::ProviderNotSupported(_) => {
                (StatusCode::NOT_FOUND, "provider_not_supported", self.to_string())
            }
            AppError::InvalidOAuthState => {
                (StatusCode::BAD_REQUEST, "invalid_oauth_state", self.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::HttpClient(e) => {
                tracing::error!("HTTP client error: {e}");
                (StatusCode::BAD_GATEWAY, "provider_error", "External provider error".to_string())
            }
        };

        let body = json!({
            "error": error_type,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
