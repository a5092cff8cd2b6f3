//! CommentRepository - Repository per i commenti annidati dei post

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateCommentDTO, UpdateCommentDTO};
use crate::entities::Comment;
use sqlx::{Error, MySqlPool};

pub struct CommentRepository {
    connection_pool: MySqlPool,
}

impl CommentRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Commenti di un post dal più recente
    pub async fn find_many_by_post_id(&self, post_id: &i32) -> Result<Vec<Comment>, Error> {
        let comments = sqlx::query_as!(
            Comment,
            r#"
            SELECT comment_id, post_id, author_id, parent_id, content, created_at, updated_at
            FROM comments
            WHERE post_id = ?
            ORDER BY created_at DESC, comment_id DESC
            "#,
            post_id
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(comments)
    }
}

impl Create<Comment, (CreateCommentDTO, i32, i32)> for CommentRepository {
    /// (body, post_id, author_id): post e autore arrivano da path e middleware
    async fn create(&self, data: &(CreateCommentDTO, i32, i32)) -> Result<Comment, Error> {
        let (dto, post_id, author_id) = data;
        let result = sqlx::query!(
            "INSERT INTO comments (post_id, author_id, parent_id, content) VALUES (?, ?, ?, ?)",
            post_id,
            author_id,
            dto.parent_id,
            dto.content
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<Comment, i32> for CommentRepository {
    async fn read(&self, id: &i32) -> Result<Option<Comment>, Error> {
        let comment = sqlx::query_as!(
            Comment,
            r#"
            SELECT comment_id, post_id, author_id, parent_id, content, created_at, updated_at
            FROM comments WHERE comment_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(comment)
    }
}

impl Update<Comment, UpdateCommentDTO, i32> for CommentRepository {
    async fn update(&self, id: &i32, data: &UpdateCommentDTO) -> Result<Comment, Error> {
        sqlx::query!(
            "UPDATE comments SET content = ? WHERE comment_id = ?",
            data.content,
            id
        )
        .execute(&self.connection_pool)
        .await?;

        self.read(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Delete<i32> for CommentRepository {
    /// Le risposte annidate cadono in cascata con il padre
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query!("DELETE FROM comments WHERE comment_id = ?", id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}
