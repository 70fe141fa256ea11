//! In-memory vector index with diversity-aware retrieval.
//!
//! [`InMemoryIndex`] stores one immutable generation of [`IndexEntry`]s
//! behind a `tokio::sync::RwLock`. A rebuild swaps the whole generation
//! atomically, so concurrent readers see either the old index or the new
//! one, never a partial build. Retrieval uses Maximum Marginal Relevance
//! (MMR) to keep near-duplicate segments — common with overlapping chunks —
//! from crowding out the context window.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::document::{IndexEntry, SearchResult};
use crate::error::{RagError, Result};

/// Retrieval parameters for [`VectorIndex::search`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchParams {
    /// Number of results to return.
    pub top_k: usize,
    /// Size of the candidate pool considered before MMR selection.
    pub fetch_k: usize,
    /// Trade-off between relevance (1.0) and diversity (0.0).
    pub diversity_weight: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { top_k: 5, fetch_k: 10, diversity_weight: 0.7 }
    }
}

/// A store of `(segment, embedding)` entries supporting similarity search.
///
/// `build` replaces any prior contents atomically; `search` never observes
/// a half-built index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Replace the index contents with a new generation of entries.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Index`] if `entries` is empty or the entries
    /// carry embeddings of differing lengths. The previous generation, if
    /// any, is left untouched and remains searchable.
    async fn build(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Retrieve a relevant, diverse subset of entries for a query vector.
    ///
    /// Returns at most `params.top_k` results; fewer if the index holds
    /// fewer entries. An empty index yields an empty result, never an
    /// error.
    async fn search(&self, query: &[f32], params: &SearchParams) -> Result<Vec<SearchResult>>;

    /// Number of entries in the current generation.
    async fn len(&self) -> usize;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// An in-memory [`VectorIndex`] holding one generation at a time.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    generation: RwLock<Arc<Vec<IndexEntry>>>,
}

impl InMemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Greedily select `top_k` candidates by Maximum Marginal Relevance.
///
/// `candidates` must be ordered by descending query similarity; each item
/// is `(similarity_rank_index_into_entries, relevance)`. At every step the
/// candidate maximizing
/// `diversity_weight * relevance − (1 − diversity_weight) * max_similarity(selected)`
/// wins, with ties broken by the lower original similarity rank, so the
/// selection is fully deterministic.
fn mmr_select(
    entries: &[IndexEntry],
    candidates: &[(usize, f32)],
    top_k: usize,
    diversity_weight: f32,
) -> Vec<(usize, f32)> {
    let mut selected: Vec<(usize, f32)> = Vec::with_capacity(top_k.min(candidates.len()));
    let mut remaining: Vec<(usize, f32)> = candidates.to_vec();

    while selected.len() < top_k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &(entry_idx, relevance)) in remaining.iter().enumerate() {
            let max_selected_sim = selected
                .iter()
                .map(|&(sel_idx, _)| {
                    cosine_similarity(&entries[entry_idx].embedding, &entries[sel_idx].embedding)
                })
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if max_selected_sim.is_finite() { max_selected_sim } else { 0.0 };

            let score = diversity_weight * relevance - (1.0 - diversity_weight) * redundancy;
            // Strict comparison keeps the earlier (lower-rank) candidate on ties.
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    selected
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn build(&self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() {
            return Err(RagError::Index(
                "cannot build an index from zero entries; previous index left intact".to_string(),
            ));
        }

        // All embeddings in one generation must share a dimension, or
        // cosine similarity would silently compare truncated vectors.
        let dimensions = entries[0].embedding.len();
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimensions) {
            return Err(RagError::Index(format!(
                "mixed embedding dimensions: expected {dimensions}, got {} for segment {}@{}; \
                 previous index left intact",
                bad.embedding.len(),
                bad.segment.document_id,
                bad.segment.start_offset
            )));
        }

        let count = entries.len();
        let mut generation = self.generation.write().await;
        *generation = Arc::new(entries);
        info!(entry_count = count, "vector index rebuilt");
        Ok(())
    }

    async fn search(&self, query: &[f32], params: &SearchParams) -> Result<Vec<SearchResult>> {
        let entries = Arc::clone(&*self.generation.read().await);
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        // Rank every entry by query similarity. The sort is stable, so
        // equal scores keep insertion order and the ranking is deterministic.
        let mut ranked: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(params.fetch_k);

        let selected = mmr_select(&entries, &ranked, params.top_k, params.diversity_weight);

        Ok(selected
            .into_iter()
            .map(|(entry_idx, relevance)| SearchResult {
                segment: entries[entry_idx].segment.clone(),
                score: relevance,
            })
            .collect())
    }

    async fn len(&self) -> usize {
        self.generation.read().await.len()
    }
}
