use std::sync::Arc;

use crate::auth::jwt::JwtManager;
use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::error::AppError;
use crate::store::{NewUser, User, UserStore};

/// A verified user together with a freshly issued identity token.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    pub token: String,
}

/// Turns signup, login and OAuth callbacks into a verified user plus token.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    jwt: JwtManager,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtManager) -> Self {
        Self { users, jwt }
    }

    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthOutcome, AppError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "username, email and password are required".to_string(),
            ));
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: Some(password_hash),
                oauth_provider: None,
                oauth_provider_id: None,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User signed up");
        self.with_token(user)
    }

    /// Unknown email, OAuth-only account and wrong password all fail with the
    /// same `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, AppError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.find_by_email(email).await? else {
            verify_against_dummy(password);
            return Err(AppError::InvalidCredentials);
        };

        let Some(hash) = user.password_hash.as_deref().filter(|h| !h.is_empty()) else {
            verify_against_dummy(password);
            return Err(AppError::InvalidCredentials);
        };

        match verify_password(password, hash) {
            Ok(true) => {}
            Ok(false) => return Err(AppError::InvalidCredentials),
            Err(e) => {
                tracing::error!(
                    user_id = %user.id,
                    error = %e,
                    "Stored password hash is unreadable"
                );
                return Err(AppError::InvalidCredentials);
            }
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.with_token(user)
    }

    /// Resolves an identity-provider login: by `(provider, subject)` first,
    /// then by email (linking the provider to that account), otherwise a new
    /// password-less account is created.
    pub async fn oauth_login(
        &self,
        provider: &str,
        subject: &str,
        email: &str,
        display_name: &str,
    ) -> Result<AuthOutcome, AppError> {
        if provider.is_empty() || subject.is_empty() {
            return Err(AppError::Validation(
                "provider and subject are required".to_string(),
            ));
        }

        if let Some(user) = self.users.find_by_oauth(provider, subject).await? {
            return self.with_token(user);
        }

        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Validation(
                "identity provider did not return an email".to_string(),
            ));
        }

        let user = match self.link_or_create(provider, subject, email, display_name).await {
            Err(AppError::UserAlreadyExists) => {
                self.after_lost_insert(provider, subject, email).await?
            }
            other => other?,
        };

        self.with_token(user)
    }

    /// A concurrent request inserted a conflicting row first: either the same
    /// identity's first login, or a signup with the same email.
    async fn after_lost_insert(
        &self,
        provider: &str,
        subject: &str,
        email: &str,
    ) -> Result<User, AppError> {
        if let Some(user) = self.users.find_by_oauth(provider, subject).await? {
            return Ok(user);
        }

        let existing = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserAlreadyExists)?;

        let user = self.users.link_oauth(&existing.id, provider, subject).await?;
        tracing::info!(
            user_id = %user.id,
            provider,
            "Linked identity provider after concurrent signup"
        );
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn link_or_create(
        &self,
        provider: &str,
        subject: &str,
        email: &str,
        display_name: &str,
    ) -> Result<User, AppError> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            let user = self.users.link_oauth(&existing.id, provider, subject).await?;
            tracing::info!(
                user_id = %user.id,
                provider,
                "Linked identity provider to existing account"
            );
            return Ok(user);
        }

        let username = match display_name.trim() {
            "" => email.split('@').next().unwrap_or(email).to_string(),
            name => name.to_string(),
        };

        let user = self
            .users
            .create(NewUser {
                username,
                email: email.to_string(),
                password_hash: None,
                oauth_provider: Some(provider.to_string()),
                oauth_provider_id: Some(subject.to_string()),
            })
            .await?;

        tracing::info!(user_id = %user.id, provider, "Created account from identity provider");
        Ok(user)
    }

    fn with_token(&self, user: User) -> Result<AuthOutcome, AppError> {
        let token = self.jwt.issue(&user.id)?;
        Ok(AuthOutcome { user, token })
    }
}
