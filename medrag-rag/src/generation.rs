//! Generator trait for producing free-text continuations from a prompt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Sampling parameters passed to the generation backend.
///
/// Defaults favor deterministic, factual phrasing: low temperature and a
/// repetition penalty above 1.0 to discourage the repeated lines common in
/// small local models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Cap on the number of newly generated tokens.
    pub max_new_tokens: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling bound.
    pub top_p: f32,
    /// Top-k sampling bound.
    pub top_k: usize,
    /// Values above 1.0 discourage token repetition.
    pub repetition_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.2,
            top_p: 0.9,
            top_k: 40,
            repetition_penalty: 1.2,
        }
    }
}

impl GenerationParams {
    /// Create a new builder for constructing [`GenerationParams`].
    pub fn builder() -> GenerationParamsBuilder {
        GenerationParamsBuilder::default()
    }
}

/// Builder for constructing validated [`GenerationParams`].
#[derive(Debug, Clone, Default)]
pub struct GenerationParamsBuilder {
    params: GenerationParams,
}

impl GenerationParamsBuilder {
    /// Set the cap on newly generated tokens.
    pub fn max_new_tokens(mut self, max: usize) -> Self {
        self.params.max_new_tokens = max;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = temperature;
        self
    }

    /// Set the nucleus sampling bound.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.params.top_p = top_p;
        self
    }

    /// Set the top-k sampling bound.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.params.top_k = top_k;
        self
    }

    /// Set the repetition penalty.
    pub fn repetition_penalty(mut self, penalty: f32) -> Self {
        self.params.repetition_penalty = penalty;
        self
    }

    /// Build the [`GenerationParams`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `max_new_tokens == 0`
    /// - `temperature < 0`
    /// - `top_p` is outside `(0, 1]`
    /// - `repetition_penalty < 1`
    pub fn build(self) -> Result<GenerationParams> {
        let p = &self.params;
        if p.max_new_tokens == 0 {
            return Err(RagError::Config("max_new_tokens must be greater than zero".to_string()));
        }
        if p.temperature < 0.0 {
            return Err(RagError::Config("temperature must be non-negative".to_string()));
        }
        if p.top_p <= 0.0 || p.top_p > 1.0 {
            return Err(RagError::Config(format!("top_p ({}) must be in (0, 1]", p.top_p)));
        }
        if p.repetition_penalty < 1.0 {
            return Err(RagError::Config(format!(
                "repetition_penalty ({}) must be at least 1.0",
                p.repetition_penalty
            )));
        }
        Ok(self.params)
    }
}

/// A language model that produces a free-text continuation from a prompt.
///
/// The component is stateless per call; any model loading or caching is an
/// implementation detail behind [`prepare`](Generator::prepare). On backend
/// failure implementations return
/// [`RagError::Generation`](crate::RagError::Generation); the orchestrator
/// makes a single attempt and surfaces the error as-is.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a continuation for the given prompt.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Warm up the backend (load weights, open connections).
    ///
    /// Called once by the orchestrator before the first generation. The
    /// default implementation does nothing.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let params = GenerationParams::default();
        assert_eq!(params.max_new_tokens, 200);
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.top_k, 40);
        assert_eq!(params.repetition_penalty, 1.2);
    }

    #[test]
    fn builder_validates_bounds() {
        assert!(GenerationParams::builder().max_new_tokens(0).build().is_err());
        assert!(GenerationParams::builder().temperature(-0.1).build().is_err());
        assert!(GenerationParams::builder().top_p(0.0).build().is_err());
        assert!(GenerationParams::builder().top_p(1.5).build().is_err());
        assert!(GenerationParams::builder().repetition_penalty(0.9).build().is_err());

        let params = GenerationParams::builder()
            .max_new_tokens(64)
            .temperature(0.0)
            .repetition_penalty(1.0)
            .build()
            .unwrap();
        assert_eq!(params.max_new_tokens, 64);
    }
}
