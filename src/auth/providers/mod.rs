pub mod google;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUserInfo {
    /// Stable subject id at the provider.
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// An authorization-code identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    /// Where to send the browser to start a login.
    fn authorize_url(&self, state: &str) -> Result<String, AppError>;

    /// Exchanges the callback `code` for the user's identity.
    async fn exchange(&self, code: &str) -> Result<ProviderUserInfo, AppError>;
}

/// The identity providers enabled for this deployment, keyed by id.
#[derive(Clone, Default)]
pub struct OAuthProviders {
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
}

impl OAuthProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers Google when both client id and secret are configured.
    pub fn from_config(config: &Config) -> Self {
        let mut providers = Self::new();
        if !config.google_client_id.is_empty() && !config.google_client_secret.is_empty() {
            providers.register(Arc::new(google::GoogleProvider::new(
                &config.google_client_id,
                &config.google_client_secret,
                &config.oauth_callback_url,
            )));
        } else {
            tracing::info!("Google login disabled: GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set");
        }
        providers
    }

    pub fn register(&mut self, provider: Arc<dyn OAuthProvider>) {
        self.providers
            .insert(provider.provider_id().to_string(), provider);
    }

    pub fn get(&self, provider_id: &str) -> Result<Arc<dyn OAuthProvider>, AppError> {
        self.providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| AppError::ProviderNotSupported(provider_id.to_string()))
    }
}
