use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// The caller's identity, resolved from the token by [`require_auth`].
/// Handlers read the user id from here, never from the request body.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Pulls the token out of `Authorization`. The `Bearer ` scheme prefix is
/// optional; a bare token is accepted as-is.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    Ok(token)
}

/// Gate for protected routes: validates the identity token and stores the
/// resolved [`AuthenticatedUser`] in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?.to_string();
    let claims = state.jwt.verify(&token)?;

    let user_id = Uuid::parse_str(&claims.user_id).map_err(|_| {
        tracing::debug!(claim = %claims.user_id, "Token user_id is not a valid id");
        AppError::Unauthorized
    })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user_id.to_string(),
    });

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
