//! ChatMessageRepository - Repository per i messaggi delle stanze livechat

use super::{Create, Read};
use crate::entities::ChatMessage;
use sqlx::{Error, MySqlPool};

/// Dati minimi per persistere un messaggio (REST o WebSocket)
#[derive(Debug, Clone)]
pub struct CreateChatMessage {
    pub room_id: i32,
    pub user_id: i32,
    pub content: String,
}

pub struct ChatMessageRepository {
    connection_pool: MySqlPool,
}

impl ChatMessageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Messaggi di una stanza in ordine cronologico
    pub async fn find_many_by_room_id(&self, room_id: &i32) -> Result<Vec<ChatMessage>, Error> {
        let messages = sqlx::query_as!(
            ChatMessage,
            r#"
            SELECT message_id, room_id, user_id, content, created_at
            FROM chat_messages
            WHERE room_id = ?
            ORDER BY created_at ASC, message_id ASC
            "#,
            room_id
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(messages)
    }
}

impl Create<ChatMessage, CreateChatMessage> for ChatMessageRepository {
    async fn create(&self, data: &CreateChatMessage) -> Result<ChatMessage, Error> {
        let result = sqlx::query!(
            "INSERT INTO chat_messages (room_id, user_id, content) VALUES (?, ?, ?)",
            data.room_id,
            data.user_id,
            data.content
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<ChatMessage, i32> for ChatMessageRepository {
    async fn read(&self, id: &i32) -> Result<Option<ChatMessage>, Error> {
        let message = sqlx::query_as!(
            ChatMessage,
            r#"
            SELECT message_id, room_id, user_id, content, created_at
            FROM chat_messages WHERE message_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(message)
    }
}

#[cfg(test)]
mod tests {

    use sqlx::MySqlPool;

    use super::*;
    use crate::repositories::Create;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "rooms")))]
    async fn test_messages_in_chronological_order(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ChatMessageRepository::new(pool);

        repo.create(&CreateChatMessage {
            room_id: 1,
            user_id: 1,
            content: "third".to_string(),
        })
        .await?;

        let messages = repo.find_many_by_room_id(&1).await?;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages.last().unwrap().content, "third");

        Ok(())
    }
}
