use axum::{extract::State, Json};

use super::auth::UserResponse;
use crate::auth::middleware::AuthenticatedUser;
use crate::error::AppError;
use crate::AppState;

pub async fn get_me(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.identity.get_by_id(&user.user_id).await?;
    Ok(Json(user.into()))
}
