//! Ingest - Dai CSV di ricette al vector store
//!
//! Ogni riga di CSV diventa un documento `intestazione: valore` per riga,
//! che viene spezzato in chunk ed embeddato. Le ricette già indicizzate
//! vengono saltate tramite il flag `is_embedded`.

use tracing::{info, instrument, warn};

use super::embeddings::embed_batch;
use super::split::{CHUNK_OVERLAP, CHUNK_SIZE, split_text};
use super::store::VectorStore;
use super::ChatbotError;
use crate::core::config::LlmConfig;
use crate::repositories::RecipeRepository;

/// Rende una riga del CSV come documento testuale, una colonna per riga
fn render_row(headers: &csv::StringRecord, record: &csv::StringRecord) -> String {
    headers
        .iter()
        .zip(record.iter())
        .map(|(header, value)| format!("{}: {}", header, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Estrae i documenti da un CSV (una entry per riga di dati)
pub fn documents_from_csv(content: &str) -> Result<Vec<String>, ChatbotError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers()?.clone();

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record?;
        let document = render_row(&headers, &record);
        if !document.trim().is_empty() {
            documents.push(document);
        }
    }

    Ok(documents)
}

/// Indicizza tutte le ricette con `is_embedded = false`.
/// Ritorna quante ricette sono state indicizzate in questa passata.
#[instrument(skip(recipes, store, client, llm))]
pub async fn embed_pending(
    recipes: &RecipeRepository,
    store: &VectorStore,
    client: &reqwest::Client,
    llm: &LlmConfig,
) -> Result<usize, ChatbotError> {
    let pending = recipes.find_unembedded().await?;

    if pending.is_empty() {
        return Ok(0);
    }

    let mut embedded_count = 0;

    for recipe in pending {
        info!(recipe_id = recipe.recipe_id, path = %recipe.csv_path, "Embedding recipe CSV");

        let content = match tokio::fs::read_to_string(&recipe.csv_path).await {
            Ok(content) => content,
            Err(e) => {
                // un file sparito non deve bloccare le altre ricette
                warn!(recipe_id = recipe.recipe_id, "Failed to read recipe CSV: {:?}", e);
                continue;
            }
        };

        let documents = documents_from_csv(&content)?;

        let chunks: Vec<String> = documents
            .iter()
            .flat_map(|doc| split_text(doc, CHUNK_SIZE, CHUNK_OVERLAP))
            .collect();

        if chunks.is_empty() {
            warn!(recipe_id = recipe.recipe_id, "Recipe CSV produced no chunks");
            recipes.mark_embedded(&recipe.recipe_id).await?;
            continue;
        }

        let embeddings = embed_batch(client, llm, &chunks).await?;
        store.add_chunks(recipe.recipe_id, &chunks, embeddings)?;

        recipes.mark_embedded(&recipe.recipe_id).await?;
        embedded_count += 1;

        info!(
            recipe_id = recipe.recipe_id,
            chunks = chunks.len(),
            "Recipe indexed into vector store"
        );
    }

    Ok(embedded_count)
}
