use async_trait::async_trait;

use super::pool::Db;
use super::queries;
use crate::error::AppError;
use crate::store::{
    ImageStore, NewImage, NewTodo, NewUser, StoredImage, Todo, TodoStore, User, UserStore,
};

/// Database-backed implementation of every store contract.
#[derive(Clone)]
pub struct DbStore {
    db: Db,
}

impl DbStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for DbStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        queries::users::insert(&self.db, user).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        queries::users::find_by_id(&self.db, id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        queries::users::find_by_email(&self.db, email).await
    }

    async fn find_by_oauth(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<User>, AppError> {
        queries::users::find_by_oauth(&self.db, provider, subject).await
    }

    async fn link_oauth(
        &self,
        user_id: &str,
        provider: &str,
        subject: &str,
    ) -> Result<User, AppError> {
        queries::users::set_oauth(&self.db, user_id, provider, subject).await
    }
}

#[async_trait]
impl TodoStore for DbStore {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Todo>, AppError> {
        queries::todos::list_by_user(&self.db, user_id).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, AppError> {
        queries::todos::find_by_id(&self.db, id).await
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, AppError> {
        queries::todos::insert(&self.db, todo).await
    }

    async fn update(&self, todo: &Todo) -> Result<Todo, AppError> {
        queries::todos::update(&self.db, todo).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        queries::todos::delete_by_id(&self.db, id).await
    }
}

#[async_trait]
impl ImageStore for DbStore {
    async fn save(&self, image: NewImage) -> Result<String, AppError> {
        queries::images::insert(&self.db, image).await
    }

    async fn get(&self, id: &str) -> Result<Option<StoredImage>, AppError> {
        Ok(queries::images::find_by_id(&self.db, id)
            .await?
            .map(|image| StoredImage {
                id: image.id,
                content_type: image.content_type,
                data: image.data,
            }))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        queries::images::delete_by_id(&self.db, id).await
    }
}
