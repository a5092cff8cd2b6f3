//! PostRepository - Repository per i post della community

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreatePostDTO, UpdatePostDTO};
use crate::entities::Post;
use sqlx::{Error, MySqlPool};

pub struct PostRepository {
    connection_pool: MySqlPool,
}

impl PostRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Pagina di post dal più recente, stile page-number (offset/limit)
    pub async fn find_page(&self, offset: i64, limit: i64) -> Result<Vec<Post>, Error> {
        let posts = sqlx::query_as!(
            Post,
            r#"
            SELECT post_id, title, content, thumbnail, author_id, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, post_id DESC
            LIMIT ? OFFSET ?
            "#,
            limit,
            offset
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(posts)
    }

    pub async fn count(&self) -> Result<i64, Error> {
        let row = sqlx::query!("SELECT COUNT(*) as total FROM posts")
            .fetch_one(&self.connection_pool)
            .await?;

        Ok(row.total)
    }
}

impl Create<Post, (CreatePostDTO, i32)> for PostRepository {
    /// L'autore arriva dal middleware di autenticazione, non dal body
    async fn create(&self, data: &(CreatePostDTO, i32)) -> Result<Post, Error> {
        let (dto, author_id) = data;
        let result = sqlx::query!(
            "INSERT INTO posts (title, content, thumbnail, author_id) VALUES (?, ?, ?, ?)",
            dto.title,
            dto.content,
            dto.thumbnail,
            author_id
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<Post, i32> for PostRepository {
    async fn read(&self, id: &i32) -> Result<Option<Post>, Error> {
        let post = sqlx::query_as!(
            Post,
            r#"
            SELECT post_id, title, content, thumbnail, author_id, created_at, updated_at
            FROM posts WHERE post_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(post)
    }
}

impl Update<Post, UpdatePostDTO, i32> for PostRepository {
    async fn update(&self, id: &i32, data: &UpdatePostDTO) -> Result<Post, Error> {
        sqlx::query!(
            r#"
            UPDATE posts SET
                title = COALESCE(?, title),
                content = COALESCE(?, content),
                thumbnail = COALESCE(?, thumbnail)
            WHERE post_id = ?
            "#,
            data.title,
            data.content,
            data.thumbnail,
            id
        )
        .execute(&self.connection_pool)
        .await?;

        self.read(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Delete<i32> for PostRepository {
    /// Commenti e segnalazioni cadono in cascata (FK ON DELETE CASCADE)
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query!("DELETE FROM posts WHERE post_id = ?", id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}
