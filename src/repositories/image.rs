//! ImageRepository - Registro delle immagini caricate

use super::{Create, Read};
use crate::entities::UploadedImage;
use sqlx::{Error, MySqlPool};

pub struct ImageRepository {
    connection_pool: MySqlPool,
}

impl ImageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

impl Create<UploadedImage, String> for ImageRepository {
    /// Il DTO di creazione è il path pubblico del file salvato
    async fn create(&self, file_path: &String) -> Result<UploadedImage, Error> {
        let result = sqlx::query!(
            "INSERT INTO uploaded_images (file_path) VALUES (?)",
            file_path
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<UploadedImage, i32> for ImageRepository {
    async fn read(&self, id: &i32) -> Result<Option<UploadedImage>, Error> {
        let image = sqlx::query_as!(
            UploadedImage,
            r#"
            SELECT image_id, file_path, created_at
            FROM uploaded_images WHERE image_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(image)
    }
}
