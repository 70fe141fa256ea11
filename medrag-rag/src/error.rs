//! Error types for the `medrag-rag` crate.

use thiserror::Error;

/// Errors that can occur in the RAG pipeline.
///
/// All variants are unrecoverable at the point of occurrence: the pipeline
/// performs no automatic retry and no partial-answer fallback. A failed
/// `ask` surfaces as a single descriptive error rather than a best-guess
/// answer.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding backend is unreachable or returned malformed output.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An index build was attempted with no content, or the index is
    /// otherwise unusable.
    #[error("Index error: {0}")]
    Index(String),

    /// The language-model backend failed or returned malformed output.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The question was empty or otherwise unanswerable as posed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
