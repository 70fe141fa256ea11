//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::index::SearchParams;

/// Configuration parameters for the RAG pipeline.
///
/// Defaults follow the tuned values of the medical Q&A system: small
/// chunks for precise retrieval, a wide candidate pool narrowed by MMR,
/// and three source excerpts per answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Soft maximum segment size in bytes.
    pub chunk_size: usize,
    /// Trailing bytes each segment shares with the next.
    pub chunk_overlap: usize,
    /// Number of segments returned by retrieval.
    pub top_k: usize,
    /// Candidate pool size considered before MMR selection.
    pub fetch_k: usize,
    /// MMR trade-off between relevance (1.0) and diversity (0.0).
    pub diversity_weight: f32,
    /// Maximum number of source excerpts attached to an answer.
    pub max_sources: usize,
    /// Length in characters at which source excerpts are truncated.
    pub source_excerpt_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            chunk_overlap: 100,
            top_k: 5,
            fetch_k: 10,
            diversity_weight: 0.7,
            max_sources: 3,
            source_excerpt_chars: 200,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The retrieval parameters derived from this configuration.
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            top_k: self.top_k,
            fetch_k: self.fetch_k,
            diversity_weight: self.diversity_weight,
        }
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the soft maximum segment size in bytes.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive segments in bytes.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of segments returned by retrieval.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the candidate pool size considered before MMR selection.
    pub fn fetch_k(mut self, fetch_k: usize) -> Self {
        self.config.fetch_k = fetch_k;
        self
    }

    /// Set the MMR relevance/diversity trade-off.
    pub fn diversity_weight(mut self, weight: f32) -> Self {
        self.config.diversity_weight = weight;
        self
    }

    /// Set the maximum number of source excerpts per answer.
    pub fn max_sources(mut self, max: usize) -> Self {
        self.config.max_sources = max;
        self
    }

    /// Set the excerpt truncation length in characters.
    pub fn source_excerpt_chars(mut self, chars: usize) -> Self {
        self.config.source_excerpt_chars = chars;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `fetch_k < top_k`
    /// - `diversity_weight` is outside `[0, 1]`
    pub fn build(self) -> Result<RagConfig> {
        let c = &self.config;
        if c.chunk_overlap >= c.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if c.fetch_k < c.top_k {
            return Err(RagError::Config(format!(
                "fetch_k ({}) must be at least top_k ({})",
                c.fetch_k, c.top_k
            )));
        }
        if !(0.0..=1.0).contains(&c.diversity_weight) {
            return Err(RagError::Config(format!(
                "diversity_weight ({}) must be within [0, 1]",
                c.diversity_weight
            )));
        }
        Ok(self.config)
    }
}
