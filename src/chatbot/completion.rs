//! Completion - Client per l'API chat completions compatibile OpenAI

use serde::{Deserialize, Serialize};

use super::ChatbotError;
use crate::core::config::LlmConfig;

/// Temperatura alta: le raccomandazioni devono variare tra una domanda e l'altra
pub const CHAT_TEMPERATURE: f32 = 0.9;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Una completion intera (il consumer risponde con un frame unico)
pub async fn chat(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[LlmMessage],
) -> Result<String, ChatbotError> {
    let url = format!("{}/v1/chat/completions", config.base_url);

    let req = ChatRequest {
        model: &config.chat_model,
        messages,
        temperature: CHAT_TEMPERATURE,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", config.api_key))
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ChatbotError::Api { status, body });
    }

    let body: ChatResponse = resp.json().await?;
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.is_empty())
        .ok_or(ChatbotError::EmptyResponse)
}
