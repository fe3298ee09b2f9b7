use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use entity::image::{ActiveModel, Entity as Images, Model as Image};

use crate::db::pool::Db;
use crate::error::AppError;
use crate::store::NewImage;

pub async fn insert(db: &Db, image: NewImage) -> Result<String, AppError> {
    let id = Uuid::new_v4().to_string();
    let size = image.data.len();

    let model = ActiveModel {
        id: Set(id.clone()),
        filename: Set(image.filename),
        content_type: Set(image.content_type),
        data: Set(image.data),
        created_at: Set(chrono::Utc::now().naive_utc()),
    };
    model.insert(db).await?;

    tracing::debug!(image_id = %id, bytes = size, "Saved image row");
    Ok(id)
}

pub async fn find_by_id(db: &Db, id: &str) -> Result<Option<Image>, AppError> {
    Ok(Images::find_by_id(id.to_string()).one(db).await?)
}

pub async fn delete_by_id(db: &Db, id: &str) -> Result<(), AppError> {
    let result = Images::delete_by_id(id.to_string()).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::ImageNotFound);
    }
    tracing::debug!(image_id = %id, "Deleted image row");
    Ok(())
}
