use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use entity::user::{ActiveModel, Column, Entity as Users, Model as User};

use crate::db::pool::Db;
use crate::error::AppError;
use crate::store::NewUser;

/// Unique-constraint violations on `users` mean the email or OAuth identity
/// is already registered.
fn map_write_error(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UserAlreadyExists,
        _ => AppError::Database(e),
    }
}

pub async fn find_by_id(db: &Db, id: &str) -> Result<Option<User>, AppError> {
    Ok(Users::find_by_id(id.to_string()).one(db).await?)
}

pub async fn find_by_email(db: &Db, email: &str) -> Result<Option<User>, AppError> {
    Ok(Users::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?)
}

pub async fn find_by_oauth(
    db: &Db,
    provider: &str,
    subject: &str,
) -> Result<Option<User>, AppError> {
    Ok(Users::find()
        .filter(Column::OauthProvider.eq(provider))
        .filter(Column::OauthProviderId.eq(subject))
        .one(db)
        .await?)
}

pub async fn insert(db: &Db, user: NewUser) -> Result<User, AppError> {
    let model = ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        username: Set(user.username),
        email: Set(user.email),
        password_hash: Set(user.password_hash),
        oauth_provider: Set(user.oauth_provider),
        oauth_provider_id: Set(user.oauth_provider_id),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };

    model.insert(db).await.map_err(map_write_error)
}

pub async fn set_oauth(
    db: &Db,
    user_id: &str,
    provider: &str,
    subject: &str,
) -> Result<User, AppError> {
    let user = find_by_id(db, user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let mut model = user.into_active_model();
    model.oauth_provider = Set(Some(provider.to_string()));
    model.oauth_provider_id = Set(Some(subject.to_string()));

    model.update(db).await.map_err(map_write_error)
}
