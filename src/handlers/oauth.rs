use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::services::AuthOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denied consent.
    pub error: Option<String>,
}

/// Starts a provider login by redirecting the browser to the provider's
/// consent page with a freshly signed `state`.
pub async fn begin(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
) -> Result<Redirect, AppError> {
    let provider = state.oauth.get(&provider_id)?;
    let oauth_state = state.oauth_state.issue(provider.provider_id())?;
    let url = provider.authorize_url(&oauth_state)?;

    tracing::debug!(provider = %provider_id, "Redirecting to identity provider");
    Ok(Redirect::to(&url))
}

/// Provider redirect target. Always answers with a redirect to the frontend:
/// the token on success, an error marker otherwise.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let frontend = state.config.frontend_url.trim_end_matches('/');

    match complete_login(&state, &provider_id, query).await {
        Ok(outcome) => {
            tracing::info!(
                provider = %provider_id,
                user_id = %outcome.user.id,
                "OAuth login completed"
            );
            Redirect::to(&format!("{frontend}/callback?token={}", outcome.token))
        }
        Err(e) => {
            tracing::warn!(provider = %provider_id, error = %e, "OAuth login failed");
            Redirect::to(&format!("{frontend}/login?error=oauth_failed"))
        }
    }
}

async fn complete_login(
    state: &AppState,
    provider_id: &str,
    query: CallbackQuery,
) -> Result<AuthOutcome, AppError> {
    let provider = state.oauth.get(provider_id)?;

    if let Some(err) = query.error {
        return Err(AppError::BadRequest(format!("provider returned error: {err}")));
    }

    let oauth_state = query.state.ok_or(AppError::InvalidOAuthState)?;
    state.oauth_state.verify(&oauth_state, provider.provider_id())?;

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    let info = provider.exchange(&code).await?;

    state
        .identity
        .oauth_login(
            provider.provider_id(),
            &info.subject,
            info.email.as_deref().unwrap_or_default(),
            info.name.as_deref().unwrap_or_default(),
        )
        .await
}
