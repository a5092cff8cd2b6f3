//! Embeddings - Client per l'API embeddings compatibile OpenAI

use serde::{Deserialize, Serialize};

use super::ChatbotError;
use crate::core::config::LlmConfig;

/// Dimensione dei batch inviati all'API embeddings
const BATCH_SIZE: usize = 64;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Genera gli embedding per un batch di testi, spezzando in sotto-batch
pub async fn embed_batch(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, ChatbotError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let url = format!("{}/v1/embeddings", config.base_url);
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(BATCH_SIZE) {
        let req = EmbedRequest {
            model: &config.embedding_model,
            input: chunk,
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

        let body: EmbedResponse = resp.json().await?;
        all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
    }

    Ok(all_embeddings)
}

/// Embedding di un singolo testo (la query dell'utente)
pub async fn embed_single(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>, ChatbotError> {
    let results = embed_batch(client, config, &[text.to_string()]).await?;
    results.into_iter().next().ok_or(ChatbotError::EmptyResponse)
}
