//! Chatbot module - La pipeline retrieval-augmented per le ricette
//!
//! Il flusso completo: i CSV di ricette caricati vengono spezzati in chunk,
//! embeddati tramite l'API OpenAI e tenuti in un vector store in memoria con
//! persistenza JSON. A ogni domanda recuperiamo i chunk più rilevanti con
//! max-marginal-relevance e costruiamo il prompt condizionato su ricette,
//! profilo utente e storia recente della conversazione.

pub mod completion;
pub mod embeddings;
pub mod ingest;
pub mod pipeline;
pub mod split;
pub mod store;

pub use completion::LlmMessage;
pub use pipeline::ChatTurn;
pub use store::VectorStore;

use thiserror::Error;

/// Errori della pipeline chatbot. I servizi HTTP li convertono in AppError,
/// le socket in frame di errore.
#[derive(Error, Debug)]
pub enum ChatbotError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("empty response from LLM API")]
    EmptyResponse,

    #[error("vector store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vector store serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("recipe CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}
