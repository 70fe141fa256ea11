//! Property tests for the in-memory index's MMR retrieval.

use std::collections::HashMap;

use medrag_rag::document::{IndexEntry, Segment};
use medrag_rag::index::{InMemoryIndex, SearchParams, VectorIndex};
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate an index entry with a normalized embedding. Offsets are
/// assigned by the caller so `(document_id, start_offset)` stays unique.
fn arb_entry(dim: usize) -> impl Strategy<Value = IndexEntry> {
    ("[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(|(text, embedding)| IndexEntry {
        segment: Segment {
            document_id: "doc_1".to_string(),
            text,
            start_offset: 0,
            metadata: HashMap::new(),
        },
        embedding,
    })
}

/// Assign unique start offsets so entries satisfy the index invariant.
fn with_unique_offsets(mut entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.segment.start_offset = i * 100;
    }
    entries
}

const DIM: usize = 16;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Search returns at most `top_k` results, never more entries than the
    /// index holds, and never a duplicated `(document_id, start_offset)`.
    #[test]
    fn result_count_bounded_and_keys_unique(
        entries in proptest::collection::vec(arb_entry(DIM), 1..20),
        query in arb_normalized_embedding(DIM),
        top_k in 1usize..25,
    ) {
        let entries = with_unique_offsets(entries);
        let count = entries.len();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let results = rt.block_on(async {
            let index = InMemoryIndex::new();
            index.build(entries).await.unwrap();
            let params = SearchParams { top_k, fetch_k: top_k.max(10), diversity_weight: 0.7 };
            index.search(&query, &params).await.unwrap()
        });

        prop_assert!(results.len() <= top_k);
        prop_assert!(results.len() <= count);

        let mut keys: Vec<(String, usize)> = results
            .iter()
            .map(|r| (r.segment.document_id.clone(), r.segment.start_offset))
            .collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), results.len());
    }

    /// Two searches with identical inputs return the identical ordered
    /// result: the MMR tie-breaking is stable.
    #[test]
    fn search_is_deterministic(
        entries in proptest::collection::vec(arb_entry(DIM), 1..20),
        query in arb_normalized_embedding(DIM),
        diversity_weight in 0.0f32..=1.0f32,
    ) {
        let entries = with_unique_offsets(entries);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let (first, second) = rt.block_on(async {
            let index = InMemoryIndex::new();
            index.build(entries).await.unwrap();
            let params = SearchParams { top_k: 5, fetch_k: 10, diversity_weight };
            let first = index.search(&query, &params).await.unwrap();
            let second = index.search(&query, &params).await.unwrap();
            (first, second)
        });

        let keys = |rs: &[medrag_rag::SearchResult]| {
            rs.iter()
                .map(|r| (r.segment.start_offset, r.score.to_bits()))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(keys(&first), keys(&second));
    }

    /// With full relevance weighting (diversity_weight = 1.0) MMR reduces
    /// to plain similarity ranking: scores come out descending.
    #[test]
    fn pure_relevance_orders_by_descending_score(
        entries in proptest::collection::vec(arb_entry(DIM), 1..20),
        query in arb_normalized_embedding(DIM),
    ) {
        let entries = with_unique_offsets(entries);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let results = rt.block_on(async {
            let index = InMemoryIndex::new();
            index.build(entries).await.unwrap();
            let params = SearchParams { top_k: 20, fetch_k: 20, diversity_weight: 1.0 };
            index.search(&query, &params).await.unwrap()
        });

        for window in results.windows(2) {
            prop_assert!(
                window[0].score >= window[1].score,
                "results not in descending order: {} < {}",
                window[0].score,
                window[1].score,
            );
        }
    }
}
