//! Vector store contract and implementations.
//!
//! The store itself is external; this module consumes its minimal
//! query/upsert/delete contract. The HTTP implementation talks to a
//! Chroma-style REST server (which embeds query texts server-side); the
//! in-memory implementation scores by token overlap and backs tests and
//! single-process deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

use crate::error::{RetrievalError, RetrievalResult};

/// Per-query deadline against the external store.
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// What to delete from a collection.
#[derive(Debug, Clone)]
pub enum DeleteSelector {
    /// Delete by chunk id.
    Ids(Vec<String>),
    /// Delete every chunk whose metadata matches all given pairs.
    Where(Map<String, Value>),
}

/// Result of a similarity query. Outer vectors are per query text, inner
/// vectors are ranked matches.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct QueryResult {
    /// Matched document texts.
    #[serde(default)]
    pub documents: Vec<Vec<String>>,
    /// Matched document metadata.
    #[serde(default)]
    pub metadatas: Vec<Vec<Map<String, Value>>>,
    /// Raw distances (L2/cosine family; smaller is closer).
    #[serde(default)]
    pub distances: Vec<Vec<f64>>,
}

/// Minimal vector store contract.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Similarity query.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, store rejection, or timeout.
    async fn query(
        &self,
        collection: &str,
        query_texts: &[String],
        n_results: usize,
        where_filter: Option<&Map<String, Value>>,
    ) -> RetrievalResult<QueryResult>;

    /// Upsert documents.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or store rejection.
    async fn add(
        &self,
        collection: &str,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> RetrievalResult<()>;

    /// Delete documents by id or metadata filter.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or store rejection.
    async fn delete(&self, collection: &str, selector: DeleteSelector) -> RetrievalResult<()>;

    /// Ensure a collection exists.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or store rejection.
    async fn get_or_create_collection(
        &self,
        name: &str,
        metadata: Option<Map<String, Value>>,
    ) -> RetrievalResult<()>;

    /// Number of documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or store rejection.
    async fn count(&self, collection: &str) -> RetrievalResult<usize>;

    /// Names of all collections.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or store rejection.
    async fn list_collections(&self) -> RetrievalResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// HTTP client for a Chroma-style vector store REST server.
#[derive(Debug, Clone)]
pub struct HttpVectorStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVectorStore {
    /// Create a client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> RetrievalResult<Self> {
        let client = reqwest::Client::builder().timeout(QUERY_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: &Value) -> RetrievalResult<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout
                } else {
                    RetrievalError::Transport(e)
                }
            })?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Store(format!("status {status}: {body}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn query(
        &self,
        collection: &str,
        query_texts: &[String],
        n_results: usize,
        where_filter: Option<&Map<String, Value>>,
    ) -> RetrievalResult<QueryResult> {
        let mut body = serde_json::json!({
            "query_texts": query_texts,
            "n_results": n_results,
        });
        if let Some(filter) = where_filter {
            body["where"] = Value::Object(filter.clone());
        }

        debug!(collection, n_results, "vector store query");
        let response = self
            .post(&format!("/collections/{collection}/query"), &body)
            .await?;
        response
            .json::<QueryResult>()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))
    }

    async fn add(
        &self,
        collection: &str,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> RetrievalResult<()> {
        let body = serde_json::json!({
            "ids": ids,
            "documents": documents,
            "metadatas": metadatas,
        });
        self.post(&format!("/collections/{collection}/add"), &body)
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, selector: DeleteSelector) -> RetrievalResult<()> {
        let body = match selector {
            DeleteSelector::Ids(ids) => serde_json::json!({ "ids": ids }),
            DeleteSelector::Where(filter) => serde_json::json!({ "where": filter }),
        };
        self.post(&format!("/collections/{collection}/delete"), &body)
            .await?;
        Ok(())
    }

    async fn get_or_create_collection(
        &self,
        name: &str,
        metadata: Option<Map<String, Value>>,
    ) -> RetrievalResult<()> {
        let body = serde_json::json!({
            "name": name,
            "metadata": metadata,
            "get_or_create": true,
        });
        self.post("/collections", &body).await?;
        Ok(())
    }

    async fn count(&self, collection: &str) -> RetrievalResult<usize> {
        let url = format!("{}/collections/{collection}/count", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RetrievalError::Store(format!(
                "status {}",
                response.status()
            )));
        }
        response
            .json::<usize>()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))
    }

    async fn list_collections(&self) -> RetrievalResult<Vec<String>> {
        let url = format!("{}/collections", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RetrievalError::Store(format!(
                "status {}",
                response.status()
            )));
        }
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredChunk {
    id: String,
    document: String,
    metadata: Map<String, Value>,
}

/// In-memory vector store scoring by token overlap.
///
/// The "distance" between a query and a document is `2 x (1 - overlap)`,
/// where `overlap` is the fraction of query tokens present in the
/// document. Under the runtime's `score = 1 - distance/2` conversion the
/// similarity score of a match is exactly its token overlap, which makes
/// threshold tests deterministic.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    collections: DashMap<String, Vec<StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn overlap_distance(query: &str, document: &str) -> f64 {
    let query_tokens = tokens(query);
    if query_tokens.is_empty() {
        return 2.0;
    }
    let doc_tokens = tokens(document);
    let hits = query_tokens.iter().filter(|t| doc_tokens.contains(*t)).count();
    #[allow(clippy::cast_precision_loss)]
    let overlap = hits as f64 / query_tokens.len() as f64;
    2.0 * (1.0 - overlap)
}

fn matches_filter(metadata: &Map<String, Value>, filter: Option<&Map<String, Value>>) -> bool {
    filter.is_none_or(|f| f.iter().all(|(k, v)| metadata.get(k) == Some(v)))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn query(
        &self,
        collection: &str,
        query_texts: &[String],
        n_results: usize,
        where_filter: Option<&Map<String, Value>>,
    ) -> RetrievalResult<QueryResult> {
        let chunks = self
            .collections
            .get(collection)
            .map(|c| c.clone())
            .unwrap_or_default();

        let mut result = QueryResult::default();
        for query in query_texts {
            let mut scored: Vec<(f64, &StoredChunk)> = chunks
                .iter()
                .filter(|c| matches_filter(&c.metadata, where_filter))
                .map(|c| (overlap_distance(query, &c.document), c))
                .collect();
            scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(n_results);

            result
                .documents
                .push(scored.iter().map(|(_, c)| c.document.clone()).collect());
            result
                .metadatas
                .push(scored.iter().map(|(_, c)| c.metadata.clone()).collect());
            result
                .distances
                .push(scored.iter().map(|(d, _)| *d).collect());
        }
        Ok(result)
    }

    async fn add(
        &self,
        collection: &str,
        ids: &[String],
        documents: &[String],
        metadatas: &[Map<String, Value>],
    ) -> RetrievalResult<()> {
        if ids.len() != documents.len() || ids.len() != metadatas.len() {
            return Err(RetrievalError::Store(
                "ids, documents, and metadatas must have equal length".to_string(),
            ));
        }
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        for ((id, document), metadata) in ids.iter().zip(documents).zip(metadatas) {
            entry.retain(|c| c.id != *id);
            entry.push(StoredChunk {
                id: id.clone(),
                document: document.clone(),
                metadata: metadata.clone(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, selector: DeleteSelector) -> RetrievalResult<()> {
        if let Some(mut entry) = self.collections.get_mut(collection) {
            match selector {
                DeleteSelector::Ids(ids) => entry.retain(|c| !ids.contains(&c.id)),
                DeleteSelector::Where(filter) => {
                    entry.retain(|c| !matches_filter(&c.metadata, Some(&filter)));
                },
            }
        }
        Ok(())
    }

    async fn get_or_create_collection(
        &self,
        name: &str,
        _metadata: Option<Map<String, Value>>,
    ) -> RetrievalResult<()> {
        self.collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn count(&self, collection: &str) -> RetrievalResult<usize> {
        Ok(self.collections.get(collection).map_or(0, |c| c.len()))
    }

    async fn list_collections(&self) -> RetrievalResult<Vec<String>> {
        Ok(self.collections.iter().map(|e| e.key().clone()).collect())
    }
}
