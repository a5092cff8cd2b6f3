//! Pipeline - Dalla domanda alla risposta del chatbot
//!
//! Recupero MMR dei chunk di ricette, poi prompt condizionato su ricette,
//! profilo dell'utente e storia recente della conversazione, infine la
//! chat completion.

use std::fmt::Write;

use tracing::{info, instrument};

use super::completion::{LlmMessage, chat};
use super::embeddings::embed_single;
use super::store::{FETCH_K, MMR_LAMBDA, RETRIEVE_K, RetrievedChunk, VectorStore};
use super::ChatbotError;
use crate::core::config::LlmConfig;

/// Turni di conversazione tenuti nel prompt
pub const MAX_HISTORY_TURNS: usize = 10;

/// Un turno completo domanda/risposta della conversazione corrente
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

fn build_system_prompt(user_data: &str) -> String {
    format!(
        "You are TastePT, a friendly recipe recommendation assistant.\n\
         Recommend dishes using ONLY the recipes provided in the user message.\n\
         The user's profile is below: respect their allergies and diet flags, \
         and prefer their favorite cuisines when it makes sense.\n\
         If none of the provided recipes fit, say so honestly instead of inventing one.\n\
         Answer in the language the user writes in.\n\n\
         User profile: {user_data}"
    )
}

fn build_context_block(chunks: &[RetrievedChunk]) -> String {
    let mut ctx = String::from("Here are recipes that match the question:\n\n");

    if chunks.is_empty() {
        ctx.push_str("(No matching recipes were found.)\n");
    } else {
        for chunk in chunks {
            write!(
                ctx,
                "--- recipe {} (part {}) ---\n{}\n\n",
                chunk.recipe_id, chunk.chunk_index, chunk.content
            )
            .expect("writing to String cannot fail");
        }
    }

    ctx
}

/// Costruisce l'array di messaggi: system, poi la storia recente, poi la
/// domanda corrente con il contesto delle ricette incorporato
fn build_messages(
    user_data: &str,
    history: &[ChatTurn],
    chunks: &[RetrievedChunk],
    question: &str,
) -> Vec<LlmMessage> {
    let recent = history.len().saturating_sub(MAX_HISTORY_TURNS);

    let mut messages = Vec::with_capacity(2 * (history.len() - recent) + 2);
    messages.push(LlmMessage::system(build_system_prompt(user_data)));

    for turn in &history[recent..] {
        messages.push(LlmMessage::user(turn.question.clone()));
        messages.push(LlmMessage::assistant(turn.answer.clone()));
    }

    let context_block = build_context_block(chunks);
    messages.push(LlmMessage::user(format!(
        "{context_block}---\nQuestion: {question}"
    )));

    messages
}

/// Esegue un turno completo della pipeline RAG
#[instrument(skip(client, llm, store, user_data, history), fields(question_len = question.len()))]
pub async fn ask(
    client: &reqwest::Client,
    llm: &LlmConfig,
    store: &VectorStore,
    question: &str,
    user_data: &str,
    history: &[ChatTurn],
) -> Result<String, ChatbotError> {
    let query_embedding = embed_single(client, llm, question).await?;

    let chunks = store.mmr_search(&query_embedding, RETRIEVE_K, FETCH_K, MMR_LAMBDA);
    info!(retrieved = chunks.len(), "Recipe chunks retrieved");

    let messages = build_messages(user_data, history, &chunks, question);

    let answer = chat(client, llm, &messages).await?;
    info!(answer_len = answer.len(), "Chatbot answer generated");

    Ok(answer)
}
