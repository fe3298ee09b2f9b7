use async_trait::async_trait;
use serde::Deserialize;

use super::{OAuthProvider, ProviderUserInfo};
use crate::error::AppError;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

impl GoogleProvider {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn provider_id(&self) -> &str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let url = reqwest::Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build Google URL: {e}")))?;

        Ok(url.to_string())
    }

    async fn exchange(&self, code: &str) -> Result<ProviderUserInfo, AppError> {
        let token: TokenResponse = self
            .http_client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .json()
            .await?;

        let access_token = match (token.access_token, token.error) {
            (Some(t), _) => t,
            (None, err) => {
                let err = err.unwrap_or_else(|| "no access_token".to_string());
                let desc = token.error_description.unwrap_or_default();
                return Err(AppError::BadRequest(format!(
                    "Google token exchange failed: {err} {desc}"
                )));
            }
        };

        let info: UserInfoResponse = self
            .http_client
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Unverified emails are not trusted for account linking.
        let email = match info.email_verified {
            Some(false) => None,
            _ => info.email,
        };

        Ok(ProviderUserInfo {
            subject: info.sub,
            email,
            name: info.name,
        })
    }
}
