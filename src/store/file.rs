use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::{detect_content_type, ImageStore, NewImage, StoredImage};
use crate::error::AppError;

const META_DIR: &str = ".meta";

/// Image store over a local upload directory. One file per image, named
/// `<uuid>[.<ext>]`; the file name is the image reference. The content type
/// recorded at upload lives in `.meta/<id>`, out of reach of any valid id.
#[derive(Debug, Clone)]
pub struct FileImageStore {
    upload_dir: PathBuf,
    meta_dir: PathBuf,
}

impl FileImageStore {
    pub async fn new(upload_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let upload_dir = upload_dir.into();
        let meta_dir = upload_dir.join(META_DIR);
        tokio::fs::create_dir_all(&meta_dir).await?;
        Ok(Self {
            upload_dir,
            meta_dir,
        })
    }

    /// Resolves a reference to a path inside the upload directory. Anything
    /// that is not a bare file name resolves to nothing.
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid || Path::new(id).file_name().and_then(|n| n.to_str()) != Some(id) {
            return None;
        }
        Some(self.upload_dir.join(id))
    }

    /// Content type recorded at upload, or sniffed when the record is missing.
    async fn content_type_for(&self, id: &str, data: &[u8]) -> String {
        match tokio::fs::read_to_string(self.meta_dir.join(id)).await {
            Ok(recorded) if !recorded.trim().is_empty() => recorded.trim().to_string(),
            _ => detect_content_type(data, None),
        }
    }
}

#[async_trait]
impl ImageStore for FileImageStore {
    async fn save(&self, image: NewImage) -> Result<String, AppError> {
        let id = match infer::get(&image.data) {
            Some(kind) => format!("{}.{}", Uuid::new_v4(), kind.extension()),
            None => Uuid::new_v4().to_string(),
        };

        tokio::fs::write(self.upload_dir.join(&id), &image.data).await?;
        if let Err(e) = tokio::fs::write(self.meta_dir.join(&id), &image.content_type).await {
            tracing::warn!(image_id = %id, error = %e, "Failed to record image content type");
        }

        tracing::debug!(
            image_id = %id,
            bytes = image.data.len(),
            filename = %image.filename,
            "Saved image file"
        );
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredImage>, AppError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(StoredImage {
                id: id.to_string(),
                content_type: self.content_type_for(id, &data).await,
                data,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let path = self.path_for(id).ok_or(AppError::ImageNotFound)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AppError::ImageNotFound),
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = tokio::fs::remove_file(self.meta_dir.join(id)).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(image_id = %id, error = %e, "Failed to remove image metadata");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    async fn temp_store() -> FileImageStore {
        let dir = std::env::temp_dir().join(format!("todo-service-images-{}", Uuid::new_v4()));
        FileImageStore::new(dir).await.unwrap()
    }

    fn png() -> NewImage {
        NewImage {
            filename: "cat.png".to_string(),
            content_type: "image/png".to_string(),
            data: PNG.to_vec(),
        }
    }

    #[tokio::test]
    async fn save_get_delete() {
        let store = temp_store().await;

        let id = store.save(png()).await.unwrap();
        assert!(id.ends_with(".png"));

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.data, PNG);
        assert_eq!(stored.content_type, "image/png");

        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
        assert!(matches!(store.delete(&id).await, Err(AppError::ImageNotFound)));
    }

    #[tokio::test]
    async fn traversal_ids_resolve_to_nothing() {
        let store = temp_store().await;

        assert!(store.get("../Cargo.toml").await.unwrap().is_none());
        assert!(store.get("..").await.unwrap().is_none());
        assert!(store.get("a/b").await.unwrap().is_none());
        assert!(matches!(store.delete("../x").await, Err(AppError::ImageNotFound)));
    }

    #[tokio::test]
    async fn declared_type_survives_when_bytes_are_not_recognised() {
        let store = temp_store().await;
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec();

        let id = store
            .save(NewImage {
                filename: "logo.svg".to_string(),
                content_type: "image/svg+xml".to_string(),
                data: svg.clone(),
            })
            .await
            .unwrap();

        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.content_type, "image/svg+xml");
        assert_eq!(stored.data, svg);

        store.delete(&id).await.unwrap();
        assert!(!store.meta_dir.join(&id).exists());
    }

    #[tokio::test]
    async fn metadata_is_not_addressable_as_an_image() {
        let store = temp_store().await;
        let id = store.save(png()).await.unwrap();

        assert!(store.get(".meta").await.unwrap().is_none());
        assert!(store.get(&format!(".meta/{id}")).await.unwrap().is_none());
        assert!(matches!(store.delete(".meta").await, Err(AppError::ImageNotFound)));
    }
}
