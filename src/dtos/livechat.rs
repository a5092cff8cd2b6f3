//! Livechat DTOs - Stanze e messaggi

use crate::entities::{ChatMessage, ChatRoom};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Debug, Validate)]
pub struct CreateChatRoomDTO {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    pub hashtags: Option<String>,
    pub image: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ChatRoomDTO {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub hashtags: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ChatRoom> for ChatRoomDTO {
    fn from(value: ChatRoom) -> Self {
        Self {
            id: value.room_id,
            title: value.title,
            content: value.content,
            hashtags: value.hashtags,
            image: value.image,
            created_at: value.created_at,
        }
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateChatMessageDTO {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

/// Il client vede solo contenuto e nickname del mittente
#[derive(Serialize, Debug)]
pub struct ChatMessageDTO {
    pub content: String,
    pub nickname: String,
}

impl From<(ChatMessage, String)> for ChatMessageDTO {
    fn from(value: (ChatMessage, String)) -> Self {
        let (message, nickname) = value;
        Self {
            content: message.content,
            nickname,
        }
    }
}
