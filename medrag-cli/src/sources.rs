//! Document sources backing the RAG pipeline.
//!
//! Two origins feed the index: literature articles collected into
//! `pubmed_articles.json` and patient summary blocks from the patient
//! store. Both are read fresh on every index rebuild, so edits to either
//! show up after `rebuild_index`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use medrag_patient::PatientStore;
use medrag_rag::{Document, DocumentSource, RagError};

use crate::collect::Article;

/// Documents from a collected `pubmed_articles.json` file.
///
/// A missing file yields zero documents — the corpus may legitimately
/// consist of patient records only.
pub struct ArticleFileSource {
    path: PathBuf,
}

impl ArticleFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentSource for ArticleFileSource {
    async fn documents(&self) -> medrag_rag::Result<Vec<Document>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| RagError::Pipeline(format!("failed to read article file: {e}")))?;
        let articles: Vec<Article> = serde_json::from_str(&raw)
            .map_err(|e| RagError::Pipeline(format!("malformed article file: {e}")))?;

        Ok(articles
            .into_iter()
            .enumerate()
            .map(|(i, article)| {
                let text = format!(
                    "Title: {}\n\nAbstract: {}\n\nSource: {}\nURL: {}",
                    article.title, article.abstract_text, article.source, article.url
                );
                let mut metadata = HashMap::new();
                metadata.insert("title".to_string(), article.title);
                metadata.insert("source".to_string(), article.source);
                metadata.insert("url".to_string(), article.url);
                Document { id: format!("article-{i}"), text, metadata }
            })
            .collect())
    }
}

/// Documents from patient summary blocks.
pub struct PatientSummarySource {
    path: PathBuf,
}

impl PatientSummarySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentSource for PatientSummarySource {
    async fn documents(&self) -> medrag_rag::Result<Vec<Document>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let store = PatientStore::open(&self.path)
            .map_err(|e| RagError::Pipeline(format!("failed to open patient store: {e}")))?;

        Ok(store
            .patient_ids()
            .iter()
            .filter_map(|id| {
                store.summary(id).map(|summary| {
                    let mut metadata = HashMap::new();
                    metadata.insert("record_id".to_string(), id.to_string());
                    Document {
                        id: format!("patient-{id}"),
                        text: format!("PATIENT RECORD:\n{summary}"),
                        metadata,
                    }
                })
            })
            .collect())
    }
}

/// Concatenates several sources into one corpus. Order between sources
/// carries no semantic meaning to the pipeline.
pub struct CompositeSource {
    sources: Vec<Arc<dyn DocumentSource>>,
}

impl CompositeSource {
    pub fn new(sources: Vec<Arc<dyn DocumentSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl DocumentSource for CompositeSource {
    async fn documents(&self) -> medrag_rag::Result<Vec<Document>> {
        let mut all = Vec::new();
        for source in &self.sources {
            all.extend(source.documents().await?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medrag_rag::StaticDocumentSource;

    #[tokio::test]
    async fn missing_files_yield_empty_corpora() {
        let articles = ArticleFileSource::new("/nonexistent/pubmed_articles.json");
        assert!(articles.documents().await.unwrap().is_empty());

        let patients = PatientSummarySource::new("/nonexistent/patients.json");
        assert!(patients.documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn composite_concatenates_in_source_order() {
        let a = Arc::new(StaticDocumentSource::new(vec![Document::new("a", "alpha")]));
        let b = Arc::new(StaticDocumentSource::new(vec![Document::new("b", "beta")]));
        let composite = CompositeSource::new(vec![a, b]);

        let docs = composite.documents().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[1].id, "b");
    }

    #[tokio::test]
    async fn article_file_maps_to_formatted_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pubmed_articles.json");
        std::fs::write(
            &path,
            r#"[{"title":"Diabetes overview","abstract":"High blood sugar.","source":"PubMed ID: 1","url":"https://pubmed.ncbi.nlm.nih.gov/1/"}]"#,
        )
        .unwrap();

        let docs = ArticleFileSource::new(&path).documents().await.unwrap();

        assert_eq!(docs.len(), 1);
        assert!(docs[0].text.starts_with("Title: Diabetes overview"));
        assert!(docs[0].text.contains("Abstract: High blood sugar."));
        assert_eq!(docs[0].metadata["source"], "PubMed ID: 1");
    }
}
