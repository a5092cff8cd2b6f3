//! VectorStore - Indice di similarità in memoria con persistenza JSON
//!
//! Le entry vivono in memoria dietro un RwLock e vengono riscritte su disco
//! a ogni aggiunta. La ricerca è coseno; il retrieval usato dalla pipeline è
//! max-marginal-relevance per non restituire tre chunk quasi identici.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ChatbotError;

/// Quanti chunk restituisce il retrieval
pub const RETRIEVE_K: usize = 3;
/// Quanti candidati considera MMR prima della selezione
pub const FETCH_K: usize = 10;
/// Bilanciamento rilevanza/diversità di MMR
pub const MMR_LAMBDA: f32 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    recipe_id: i32,
    chunk_index: usize,
    content: String,
    embedding: Vec<f32>,
}

/// Chunk restituito dal retrieval, con lo score coseno verso la query
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub recipe_id: i32,
    pub chunk_index: usize,
    pub content: String,
    pub score: f32,
}

pub struct VectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    persist_path: PathBuf,
}

impl VectorStore {
    /// Apre lo store ricaricando le entry persistite, se il file esiste
    pub fn open_or_create(persist_path: &Path) -> Result<Self, ChatbotError> {
        if let Some(parent) = persist_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = if persist_path.exists() {
            let data = std::fs::read_to_string(persist_path)?;
            serde_json::from_str(&data).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path: persist_path.to_path_buf(),
        })
    }

    /// Aggiunge i chunk di una ricetta. `embeddings` è parallelo a `chunks`.
    pub fn add_chunks(
        &self,
        recipe_id: i32,
        chunks: &[String],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(), ChatbotError> {
        let mut entries = self.entries.write();

        for (chunk_index, (content, embedding)) in
            chunks.iter().zip(embeddings.into_iter()).enumerate()
        {
            entries.push(VectorEntry {
                recipe_id,
                chunk_index,
                content: content.clone(),
                embedding,
            });
        }

        self.persist(&entries)
    }

    /// Scrittura atomica: file temporaneo + rename
    fn persist(&self, entries: &[VectorEntry]) -> Result<(), ChatbotError> {
        let data = serde_json::to_string(entries)?;
        let tmp_path = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &data)?;
        std::fs::rename(&tmp_path, &self.persist_path)?;
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Ricerca max-marginal-relevance: prende i `fetch_k` candidati più
    /// vicini per coseno e ne seleziona `k` massimizzando
    /// `lambda * sim(query, d) - (1 - lambda) * max sim(d, selezionati)`.
    pub fn mmr_search(
        &self,
        query_embedding: &[f32],
        k: usize,
        fetch_k: usize,
        lambda: f32,
    ) -> Vec<RetrievedChunk> {
        let entries = self.entries.read();

        // candidati ordinati per similarità alla query
        let mut candidates: Vec<(f32, &VectorEntry)> = entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(fetch_k);

        let mut selected: Vec<(f32, &VectorEntry)> = Vec::with_capacity(k);

        while selected.len() < k && !candidates.is_empty() {
            let mut best_index = 0;
            let mut best_score = f32::NEG_INFINITY;

            for (i, (relevance, entry)) in candidates.iter().enumerate() {
                let max_redundancy = selected
                    .iter()
                    .map(|(_, s)| cosine_similarity(&entry.embedding, &s.embedding))
                    .fold(0.0f32, f32::max);

                let mmr = lambda * relevance - (1.0 - lambda) * max_redundancy;
                if mmr > best_score {
                    best_score = mmr;
                    best_index = i;
                }
            }

            selected.push(candidates.remove(best_index));
        }

        selected
            .into_iter()
            .map(|(score, e)| RetrievedChunk {
                recipe_id: e.recipe_id,
                chunk_index: e.chunk_index,
                content: e.content.clone(),
                score,
            })
            .collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> VectorStore {
        let dir = std::env::temp_dir().join(format!("tastept-vectors-{}", uuid::Uuid::new_v4()));
        VectorStore::open_or_create(&dir.join("vectors.json")).unwrap()
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_add_and_search() {
        let store = temp_store();
        store
            .add_chunks(
                1,
                &["tofu stew".to_string(), "beef stew".to_string()],
                vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            )
            .unwrap();

        let hits = store.mmr_search(&[1.0, 0.1, 0.0], 1, 10, MMR_LAMBDA);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "tofu stew");
    }

    #[test]
    fn test_mmr_prefers_diverse_results() {
        let store = temp_store();
        // due chunk identici tra loro e uno ortogonale, meno rilevante
        store
            .add_chunks(
                1,
                &[
                    "kimchi stew a".to_string(),
                    "kimchi stew b".to_string(),
                    "tofu salad".to_string(),
                ],
                vec![
                    vec![1.0, 0.0],
                    vec![1.0, 0.0],
                    vec![0.0, 1.0],
                ],
            )
            .unwrap();

        let hits = store.mmr_search(&[1.0, 0.2], 2, 10, MMR_LAMBDA);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "kimchi stew a");
        // la pura similarità sceglierebbe il duplicato "kimchi stew b";
        // MMR lo penalizza e preferisce il risultato diverso
        assert_eq!(hits[1].content, "tofu salad");
    }

    #[test]
    fn test_search_empty_store() {
        let store = temp_store();
        assert!(store.mmr_search(&[1.0, 0.0], 3, 10, MMR_LAMBDA).is_empty());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = std::env::temp_dir().join(format!("tastept-vectors-{}", uuid::Uuid::new_v4()));
        let path = dir.join("vectors.json");

        {
            let store = VectorStore::open_or_create(&path).unwrap();
            store
                .add_chunks(7, &["persisted chunk".to_string()], vec![vec![0.5, 0.5]])
                .unwrap();
        }

        let reopened = VectorStore::open_or_create(&path).unwrap();
        assert_eq!(reopened.entry_count(), 1);
        let hits = reopened.mmr_search(&[0.5, 0.5], 1, 10, MMR_LAMBDA);
        assert_eq!(hits[0].recipe_id, 7);
    }

    #[test]
    fn test_k_larger_than_store() {
        let store = temp_store();
        store
            .add_chunks(1, &["only one".to_string()], vec![vec![1.0]])
            .unwrap();

        let hits = store.mmr_search(&[1.0], 3, 10, MMR_LAMBDA);
        assert_eq!(hits.len(), 1);
    }
}
