pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use auth::jwt::JwtManager;
use auth::oauth_state::OAuthStateSigner;
use auth::providers::OAuthProviders;
use config::{Config, ImageStorage};
use db::{Db, DbStore};
use error::AppError;
use services::{IdentityService, TodoService};
use store::file::FileImageStore;
use store::{ImageStore, TodoStore, UserStore};

/// Everything a request handler can reach. Built once at startup; every
/// field is immutable or internally pooled.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jwt: JwtManager,
    pub identity: IdentityService,
    pub todos: TodoService,
    pub images: Arc<dyn ImageStore>,
    pub oauth: OAuthProviders,
    pub oauth_state: OAuthStateSigner,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
        images: Arc<dyn ImageStore>,
        oauth: OAuthProviders,
    ) -> Result<Self, AppError> {
        let jwt = JwtManager::new(&config.jwt_secret)?;
        let oauth_state = OAuthStateSigner::new(config.oauth_state_secret());

        Ok(Self {
            identity: IdentityService::new(users, jwt.clone()),
            todos: TodoService::new(todos, images.clone()),
            images,
            jwt,
            oauth,
            oauth_state,
            config,
        })
    }

    /// Wires the database-backed stores, with images in the database or the
    /// upload directory depending on `IMAGE_STORAGE`.
    pub async fn with_database(
        config: Config,
        db: Db,
        oauth: OAuthProviders,
    ) -> Result<Self, AppError> {
        let store = Arc::new(DbStore::new(db));

        let images: Arc<dyn ImageStore> = match config.image_storage {
            ImageStorage::Database => store.clone(),
            ImageStorage::File => Arc::new(FileImageStore::new(&config.upload_dir).await?),
        };

        Self::new(config, store.clone(), store, images, oauth)
    }
}
