//! RAG orchestrator for medical question answering.
//!
//! [`MedicalRag`] coordinates the full pipeline: document loading,
//! chunking, embedding, index building, retrieval, prompt assembly,
//! generation, and answer post-processing, behind the single public
//! contract `ask(question) -> Answer`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medrag_rag::{MedicalRag, RagConfig, SeparatorChunker, StaticDocumentSource};
//!
//! let rag = MedicalRag::builder()
//!     .config(RagConfig::default())
//!     .document_source(Arc::new(StaticDocumentSource::new(documents)))
//!     .chunker(Arc::new(SeparatorChunker::new(300, 100)))
//!     .embedding_provider(Arc::new(embedder))
//!     .generator(Arc::new(generator))
//!     .build()?;
//!
//! let answer = rag.ask("What is John Doe's blood sugar?").await?;
//! println!("{} [{}]", answer.text, answer.confidence);
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::answer::{clean_answer, Answer, Confidence};
use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{DocumentSource, IndexEntry};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{GenerationParams, Generator};
use crate::index::{InMemoryIndex, VectorIndex};
use crate::prompt::build_prompt;

/// Initialization state of a [`MedicalRag`] instance.
///
/// `ask` requires `Ready`; if the orchestrator has not reached it yet, it
/// lazily builds the index and prepares the generator on the first call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No index has been built.
    Uninitialized,
    /// The index is built; the generator has not been prepared.
    IndexBuilt,
    /// Fully initialized; `ask` proceeds directly to retrieval.
    Ready,
}

/// The medical RAG orchestrator.
///
/// Owns the process-wide pipeline state (current index generation,
/// embedding provider, generator) so that independent instances — e.g. in
/// tests — do not interfere. Construct one via [`MedicalRag::builder()`].
pub struct MedicalRag {
    config: RagConfig,
    generation_params: GenerationParams,
    source: Arc<dyn DocumentSource>,
    chunker: Arc<dyn Chunker>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn Generator>,
    index: Arc<dyn VectorIndex>,
    state: Mutex<State>,
}

impl MedicalRag {
    /// Create a new [`MedicalRagBuilder`].
    pub fn builder() -> MedicalRagBuilder {
        MedicalRagBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Current initialization state.
    pub async fn state(&self) -> State {
        *self.state.lock().await
    }

    /// Rebuild the vector index from the current document source.
    ///
    /// Must be called whenever the document source's contents change. The
    /// swap is atomic: searches observe either the previous generation or
    /// the new one, never a partial build.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Index`] if the source holds no documents (or
    /// only empty ones); the previous index, if any, is left untouched and
    /// remains searchable. Embedding failures propagate as
    /// [`RagError::Embedding`].
    pub async fn rebuild_index(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.build_index().await?;
        if *state == State::Uninitialized {
            *state = State::IndexBuilt;
        }
        Ok(())
    }

    /// Chunk, embed, and build the index. Caller holds the state lock.
    async fn build_index(&self) -> Result<()> {
        let documents = self.source.documents().await?;
        if documents.is_empty() {
            error!("index rebuild requested with an empty document source");
            return Err(RagError::Index(
                "document source is empty; nothing to index".to_string(),
            ));
        }
        info!(document_count = documents.len(), "building index");

        let segments: Vec<_> =
            documents.iter().flat_map(|doc| self.chunker.chunk(doc)).collect();
        if segments.is_empty() {
            return Err(RagError::Index(
                "documents produced no segments; nothing to index".to_string(),
            ));
        }
        debug!(segment_count = segments.len(), "chunked documents");

        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await?;

        let entries: Vec<IndexEntry> = segments
            .into_iter()
            .zip(embeddings)
            .map(|(segment, embedding)| IndexEntry { segment, embedding })
            .collect();

        self.index.build(entries).await
    }

    /// Drive the state machine to `Ready`, lazily building the index and
    /// preparing the generator as needed.
    async fn ensure_ready(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state == State::Uninitialized {
            self.build_index().await?;
            *state = State::IndexBuilt;
        }
        if *state == State::IndexBuilt {
            self.generator.prepare().await?;
            *state = State::Ready;
        }
        Ok(())
    }

    /// Answer a question from the indexed corpus.
    ///
    /// Flow: validate and normalize the question, embed it, retrieve a
    /// diverse set of segments, assemble the prompt, generate, clean the
    /// answer, and grade confidence from the number of segments actually
    /// retrieved. Any sub-component failure propagates as a single error;
    /// there are no retries and no partial answers.
    ///
    /// # Errors
    ///
    /// [`RagError::Validation`] for an empty or whitespace-only question;
    /// otherwise whatever the failing sub-component reported.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = normalize_question(question)?;
        self.ensure_ready().await?;

        let query_embedding = self.embedding_provider.embed(&question).await?;
        let results =
            self.index.search(&query_embedding, &self.config.search_params()).await?;
        info!(question = %question, retrieved = results.len(), "retrieval complete");

        let context: Vec<String> = results.iter().map(|r| r.segment.text.clone()).collect();
        let prompt = build_prompt(&question, &context);

        let raw = self.generator.generate(&prompt, &self.generation_params).await?;
        let text = clean_answer(&raw);

        let confidence = Confidence::from_source_count(results.len());
        let sources: Vec<String> = results
            .iter()
            .take(self.config.max_sources)
            .map(|r| excerpt(&r.segment.text, self.config.source_excerpt_chars))
            .collect();

        info!(%confidence, source_count = sources.len(), "answer produced");
        Ok(Answer { text, sources, confidence })
    }
}

/// Trim the question and ensure it ends with a question mark.
fn normalize_question(question: &str) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        return Err(RagError::Validation("question must not be empty".to_string()));
    }
    if question.ends_with('?') {
        Ok(question.to_string())
    } else {
        Ok(format!("{question}?"))
    }
}

/// Truncate text to at most `max_chars` characters and append an ellipsis.
fn excerpt(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

/// Builder for constructing a [`MedicalRag`].
///
/// The document source, chunker, embedding provider, and generator are
/// required; the config, generation parameters, and index fall back to
/// defaults (an empty [`InMemoryIndex`]).
#[derive(Default)]
pub struct MedicalRagBuilder {
    config: Option<RagConfig>,
    generation_params: Option<GenerationParams>,
    source: Option<Arc<dyn DocumentSource>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn Generator>>,
    index: Option<Arc<dyn VectorIndex>>,
}

impl MedicalRagBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the generation sampling parameters.
    pub fn generation_params(mut self, params: GenerationParams) -> Self {
        self.generation_params = Some(params);
        self
    }

    /// Set the document source.
    pub fn document_source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation backend.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the vector index backend.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the [`MedicalRag`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<MedicalRag> {
        let source = self
            .source
            .ok_or_else(|| RagError::Config("document_source is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;

        Ok(MedicalRag {
            config: self.config.unwrap_or_default(),
            generation_params: self.generation_params.unwrap_or_default(),
            source,
            chunker,
            embedding_provider,
            generator,
            index: self.index.unwrap_or_else(|| Arc::new(InMemoryIndex::new())),
            state: Mutex::new(State::Uninitialized),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;
    use crate::chunking::SeparatorChunker;
    use crate::document::Document;

    /// Deterministic bag-of-keywords embedder: one dimension per keyword,
    /// valued by occurrence count in the lowercased text.
    struct KeywordEmbedder;

    const VOCAB: [&str; 6] = ["diabetes", "metabolic", "blood", "sugar", "fasting", "patient"];

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(VOCAB.iter().map(|word| lower.matches(word).count() as f32).collect())
        }

        fn dimensions(&self) -> usize {
            VOCAB.len()
        }
    }

    /// Generator returning a fixed answer and recording the last prompt.
    struct ScriptedGenerator {
        response: String,
        last_prompt: StdMutex<Option<String>>,
    }

    impl ScriptedGenerator {
        fn new(response: &str) -> Self {
            Self { response: response.to_string(), last_prompt: StdMutex::new(None) }
        }
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
            Err(RagError::Generation {
                provider: "test".to_string(),
                message: "backend down".to_string(),
            })
        }
    }

    /// Document source whose contents can be swapped between rebuilds.
    #[derive(Default)]
    struct MutableSource {
        documents: StdMutex<Vec<Document>>,
    }

    #[async_trait]
    impl DocumentSource for MutableSource {
        async fn documents(&self) -> Result<Vec<Document>> {
            Ok(self.documents.lock().unwrap().clone())
        }
    }

    fn corpus() -> Vec<Document> {
        let mut patient_meta = HashMap::new();
        patient_meta.insert("record_id".to_string(), "P001".to_string());
        vec![
            Document::new(
                "pubmed-1",
                "Diabetes mellitus is a metabolic disorder characterized by high blood sugar.",
            ),
            Document {
                id: "patient-P001".to_string(),
                text: "PATIENT RECORD:\nPatient ID: P001\nName: John Doe\nAge: 45 years\n\
                       Gender: Male\n\nLatest Measurements:\n- Blood Sugar (Fasting): 180 mg/dL"
                    .to_string(),
                metadata: patient_meta,
            },
        ]
    }

    fn rag_with(generator: Arc<dyn Generator>, documents: Vec<Document>) -> MedicalRag {
        MedicalRag::builder()
            .document_source(Arc::new(crate::document::StaticDocumentSource::new(documents)))
            .chunker(Arc::new(SeparatorChunker::new(300, 100)))
            .embedding_provider(Arc::new(KeywordEmbedder))
            .generator(generator)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn ask_lazily_initializes_to_ready() {
        let rag = rag_with(Arc::new(ScriptedGenerator::new("An answer.")), corpus());
        assert_eq!(rag.state().await, State::Uninitialized);

        rag.ask("What is diabetes?").await.unwrap();
        assert_eq!(rag.state().await, State::Ready);
    }

    #[tokio::test]
    async fn rebuild_index_reaches_index_built_not_ready() {
        let rag = rag_with(Arc::new(ScriptedGenerator::new("An answer.")), corpus());
        rag.rebuild_index().await.unwrap();
        assert_eq!(rag.state().await, State::IndexBuilt);
    }

    #[tokio::test]
    async fn rejects_blank_question() {
        let rag = rag_with(Arc::new(ScriptedGenerator::new("An answer.")), corpus());
        let err = rag.ask("   ").await.unwrap_err();
        assert!(matches!(err, RagError::Validation(_)));
        // Validation happens before any lazy initialization.
        assert_eq!(rag.state().await, State::Uninitialized);
    }

    #[tokio::test]
    async fn normalizes_question_with_trailing_question_mark() {
        let generator = Arc::new(ScriptedGenerator::new("An answer."));
        let rag = rag_with(generator.clone(), corpus());
        rag.ask("  What is diabetes  ").await.unwrap();

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Question: What is diabetes?"));
    }

    #[tokio::test]
    async fn answers_patient_question_with_record_among_sources() {
        let rag = rag_with(
            Arc::new(ScriptedGenerator::new("The fasting blood sugar is 180 mg/dL.")),
            corpus(),
        );
        let answer = rag.ask("What is John Doe's blood sugar?").await.unwrap();

        assert_eq!(answer.text, "The fasting blood sugar is 180 mg/dL.");
        assert!(
            answer.sources.iter().any(|s| s.contains("Blood Sugar (Fasting): 180 mg/dL")),
            "patient record missing from sources: {:?}",
            answer.sources
        );
        // Both corpus documents fit one segment each, so confidence follows
        // the actual retrieved count of two.
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn source_excerpts_are_truncated_with_ellipsis() {
        let long_text = format!("diabetes {}", "x".repeat(400));
        let rag = rag_with(
            Arc::new(ScriptedGenerator::new("An answer.")),
            vec![Document::new("d1", long_text)],
        );
        let answer = rag.ask("What about diabetes?").await.unwrap();

        for source in &answer.sources {
            assert!(source.ends_with("..."));
            assert!(source.chars().count() <= 200 + 3);
        }
    }

    #[tokio::test]
    async fn rebuild_with_empty_source_fails_and_keeps_old_index() {
        let source = Arc::new(MutableSource::default());
        *source.documents.lock().unwrap() = corpus();

        let rag = MedicalRag::builder()
            .document_source(source.clone())
            .chunker(Arc::new(SeparatorChunker::new(300, 100)))
            .embedding_provider(Arc::new(KeywordEmbedder))
            .generator(Arc::new(ScriptedGenerator::new("An answer.")))
            .build()
            .unwrap();
        rag.rebuild_index().await.unwrap();

        source.documents.lock().unwrap().clear();
        let err = rag.rebuild_index().await.unwrap_err();
        assert!(matches!(err, RagError::Index(_)));

        // The previously built index still answers.
        let answer = rag.ask("What is diabetes?").await.unwrap();
        assert!(!answer.sources.is_empty());
    }

    #[tokio::test]
    async fn uninitialized_ask_with_empty_source_surfaces_index_error() {
        let rag = rag_with(Arc::new(ScriptedGenerator::new("An answer.")), Vec::new());
        let err = rag.ask("What is diabetes?").await.unwrap_err();
        assert!(matches!(err, RagError::Index(_)));
        assert_eq!(rag.state().await, State::Uninitialized);
    }

    #[tokio::test]
    async fn generation_failure_propagates_without_partial_answer() {
        let rag = rag_with(Arc::new(FailingGenerator), corpus());
        let err = rag.ask("What is diabetes?").await.unwrap_err();
        assert!(matches!(err, RagError::Generation { .. }));
    }

    #[tokio::test]
    async fn builder_requires_all_components() {
        let err = MedicalRag::builder().build();
        assert!(matches!(err, Err(RagError::Config(_))));
    }
}
