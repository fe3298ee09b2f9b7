use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use entity::todo::{ActiveModel, Column, Entity as Todos, Model as Todo};

use crate::db::pool::Db;
use crate::error::AppError;
use crate::store::NewTodo;

pub async fn list_by_user(db: &Db, user_id: &str) -> Result<Vec<Todo>, AppError> {
    Ok(Todos::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .all(db)
        .await?)
}

pub async fn find_by_id(db: &Db, id: &str) -> Result<Option<Todo>, AppError> {
    Ok(Todos::find_by_id(id.to_string()).one(db).await?)
}

pub async fn insert(db: &Db, todo: NewTodo) -> Result<Todo, AppError> {
    let now = chrono::Utc::now().naive_utc();
    let model = ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(todo.user_id),
        title: Set(todo.title),
        description: Set(todo.description),
        status: Set(todo.status),
        image_id: Set(todo.image_id),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(db).await?)
}

/// Writes the mutable columns. Owner and creation time are never touched.
pub async fn update(db: &Db, todo: &Todo) -> Result<Todo, AppError> {
    let model = ActiveModel {
        id: Unchanged(todo.id.clone()),
        user_id: Unchanged(todo.user_id.clone()),
        title: Set(todo.title.clone()),
        description: Set(todo.description.clone()),
        status: Set(todo.status.clone()),
        image_id: Set(todo.image_id.clone()),
        created_at: Unchanged(todo.created_at),
        updated_at: Set(todo.updated_at),
    };

    match model.update(db).await {
        Ok(updated) => Ok(updated),
        Err(DbErr::RecordNotUpdated) => Err(AppError::TodoNotFound),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_by_id(db: &Db, id: &str) -> Result<(), AppError> {
    let result = Todos::delete_by_id(id.to_string()).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::TodoNotFound);
    }
    Ok(())
}
