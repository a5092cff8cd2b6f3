//! ChatRoomRepository - Repository per le stanze livechat

use super::{Create, Delete, Read};
use crate::dtos::CreateChatRoomDTO;
use crate::entities::ChatRoom;
use sqlx::{Error, MySqlPool};

pub struct ChatRoomRepository {
    connection_pool: MySqlPool,
}

impl ChatRoomRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_all(&self) -> Result<Vec<ChatRoom>, Error> {
        let rooms = sqlx::query_as!(
            ChatRoom,
            r#"
            SELECT room_id, title, content, hashtags, image, created_at
            FROM chat_rooms
            ORDER BY room_id ASC
            "#
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(rooms)
    }
}

impl Create<ChatRoom, CreateChatRoomDTO> for ChatRoomRepository {
    async fn create(&self, data: &CreateChatRoomDTO) -> Result<ChatRoom, Error> {
        let result = sqlx::query!(
            "INSERT INTO chat_rooms (title, content, hashtags, image) VALUES (?, ?, ?, ?)",
            data.title,
            data.content,
            data.hashtags,
            data.image
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<ChatRoom, i32> for ChatRoomRepository {
    async fn read(&self, id: &i32) -> Result<Option<ChatRoom>, Error> {
        let room = sqlx::query_as!(
            ChatRoom,
            r#"
            SELECT room_id, title, content, hashtags, image, created_at
            FROM chat_rooms WHERE room_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(room)
    }
}

impl Delete<i32> for ChatRoomRepository {
    /// I messaggi della stanza cadono in cascata
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        sqlx::query!("DELETE FROM chat_rooms WHERE room_id = ?", id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}
