//! Data types for documents, segments, and search results.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A source document containing text content and provenance metadata.
///
/// Documents are immutable once created: the pipeline never edits them,
/// it only derives [`Segment`]s from them at index-build time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata (title, source, URL, record id).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new() }
    }
}

/// A bounded-size slice of a [`Document`] used as a retrieval unit.
///
/// Segments from one document may overlap in text, but
/// `(document_id, start_offset)` is unique within an index generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// The text content of the segment.
    pub text: String,
    /// Byte offset of this segment within the parent document's text.
    pub start_offset: usize,
    /// Metadata inherited from the parent document plus segment-specific fields.
    pub metadata: HashMap<String, String>,
}

/// A [`Segment`] paired with its embedding vector.
///
/// The embedding length is constant across one index generation (the
/// embedding model's fixed dimensionality). Entries live for exactly one
/// generation: the whole index is rebuilt when the document set changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// The indexed segment.
    pub segment: Segment,
    /// The vector embedding for this segment's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Segment`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved segment.
    pub segment: Segment,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A supplier of the raw document corpus.
///
/// Implementations typically concatenate literature-derived documents and
/// patient-summary documents; the order carries no semantic meaning to the
/// pipeline.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Return the current set of documents to index.
    async fn documents(&self) -> Result<Vec<Document>>;
}

/// A [`DocumentSource`] over a fixed, in-memory collection.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentSource {
    documents: Vec<Document>,
}

impl StaticDocumentSource {
    /// Create a source that always returns the given documents.
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentSource for StaticDocumentSource {
    async fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}
