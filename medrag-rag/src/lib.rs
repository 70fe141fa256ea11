//! # medrag-rag
//!
//! Retrieval-Augmented Generation core for medical question answering.
//!
//! ## Overview
//!
//! The pipeline ingests a document corpus (research abstracts and patient
//! summaries), splits it into overlapping segments, embeds them into a
//! vector index, and answers natural-language questions by retrieving a
//! relevant, diverse context via Maximum Marginal Relevance and feeding it
//! to a language model. Answers come back as
//! `{ text, sources, confidence }`.
//!
//! The system is a best-effort retrieval aid, not a diagnostic authority:
//! the generator is instructed to answer only from the retrieved context
//! and to disclose uncertainty, and every backend failure surfaces as an
//! error instead of a fabricated answer.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medrag_rag::{MedicalRag, RagConfig, SeparatorChunker, StaticDocumentSource};
//! use medrag_rag::openai::{OpenAiEmbeddings, OpenAiGenerator};
//!
//! let rag = MedicalRag::builder()
//!     .config(RagConfig::default())
//!     .document_source(Arc::new(StaticDocumentSource::new(documents)))
//!     .chunker(Arc::new(SeparatorChunker::new(300, 100)))
//!     .embedding_provider(Arc::new(OpenAiEmbeddings::new(api_key)?))
//!     .generator(Arc::new(OpenAiGenerator::new(api_key)?))
//!     .build()?;
//!
//! let answer = rag.ask("What is John Doe's blood sugar?").await?;
//! println!("{} (confidence: {})", answer.text, answer.confidence);
//! for source in &answer.sources {
//!     println!("  - {source}");
//! }
//! ```
//!
//! ## Components
//!
//! - [`SeparatorChunker`] — bounded-size overlapping segments along
//!   natural text boundaries
//! - [`EmbeddingProvider`] — adapter trait over embedding backends
//! - [`InMemoryIndex`] — atomic-rebuild vector index with MMR retrieval
//! - [`Generator`] — adapter trait over language-model backends
//! - [`MedicalRag`] — the orchestrator tying it all together

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod openai;
pub mod pipeline;
pub mod prompt;

pub use answer::{clean_answer, Answer, Confidence};
pub use chunking::{Chunker, SeparatorChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Document, DocumentSource, IndexEntry, SearchResult, Segment, StaticDocumentSource};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::{GenerationParams, Generator};
pub use index::{InMemoryIndex, SearchParams, VectorIndex};
pub use pipeline::{MedicalRag, MedicalRagBuilder, State};
pub use prompt::build_prompt;
