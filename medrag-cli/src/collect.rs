//! PubMed article collector.
//!
//! Fetches article metadata from the NCBI E-utilities API (`esearch` for
//! IDs, `esummary` for titles/abstracts) and saves the result as
//! `pubmed_articles.json` in the data directory, where the document
//! sources pick it up at index-build time.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Topics fetched by default when no query is given.
pub const DEFAULT_TOPICS: [&str; 8] = [
    "anatomy basics",
    "cardiovascular system",
    "respiratory system",
    "digestive system",
    "nervous system",
    "diabetes mellitus",
    "hypertension",
    "infectious diseases",
];

/// One collected article, as stored in `pubmed_articles.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Article title.
    pub title: String,
    /// Abstract text; may be empty when the summary carries none.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Human-readable provenance, e.g. `PubMed ID: 12345`.
    pub source: String,
    /// Link to the article page.
    pub url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    esearchresult: EsearchResult,
}

#[derive(Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Build the `esearch` request for one query. Query-string encoding is
/// left to the client, which handles spaces and reserved characters.
fn search_request(
    client: &reqwest::Client,
    query: &str,
    max_results: usize,
) -> reqwest::RequestBuilder {
    client
        .get(format!("{EUTILS_BASE_URL}/esearch.fcgi"))
        .query(&[("db", "pubmed"), ("term", query), ("retmode", "json")])
        .query(&[("retmax", max_results)])
}

/// Fetch up to `max_results` article summaries for one query.
pub async fn fetch_articles(
    client: &reqwest::Client,
    query: &str,
    max_results: usize,
) -> anyhow::Result<Vec<Article>> {
    let search: SearchResponse = search_request(client, query, max_results)
        .send()
        .await
        .context("esearch request failed")?
        .json()
        .await
        .context("esearch returned malformed JSON")?;

    let mut articles = Vec::new();
    for pmid in &search.esearchresult.idlist {
        let summary_request = client
            .get(format!("{EUTILS_BASE_URL}/esummary.fcgi"))
            .query(&[("db", "pubmed"), ("id", pmid.as_str()), ("retmode", "json")]);
        let summary: Value = match summary_request.send().await {
            Ok(response) => response.json().await.context("esummary returned malformed JSON")?,
            Err(e) => {
                warn!(pmid, error = %e, "esummary request failed, skipping article");
                continue;
            }
        };

        let Some(record) = summary.get("result").and_then(|r| r.get(pmid)) else {
            continue;
        };
        articles.push(Article {
            title: record.get("title").and_then(Value::as_str).unwrap_or_default().to_string(),
            abstract_text: record
                .get("abstract")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            source: format!("PubMed ID: {pmid}"),
            url: format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"),
        });
    }

    Ok(articles)
}

/// Fetch all queries and write `pubmed_articles.json` into `data_dir`.
pub async fn collect_all(
    queries: &[String],
    max_results: usize,
    data_dir: &Path,
) -> anyhow::Result<usize> {
    let client = reqwest::Client::new();
    let mut all_articles = Vec::new();

    for query in queries {
        info!(query = %query, "fetching articles");
        let articles = fetch_articles(&client, query, max_results).await?;
        all_articles.extend(articles);
    }

    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join("pubmed_articles.json");
    let raw = serde_json::to_string_pretty(&all_articles)?;
    std::fs::write(&path, raw)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(count = all_articles.len(), path = %path.display(), "articles saved");
    Ok(all_articles.len())
}
