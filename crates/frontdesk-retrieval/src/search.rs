//! Query construction and similarity search.
//!
//! Known question intents get a short canonical prefix to bias retrieval
//! toward the right documents; everything else searches on the raw text.
//! Store distances are converted to `[0, 1]` similarity scores with
//! `score = 1 - distance / 2` (L2/cosine family assumption).

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{RetrievalError, RetrievalResult};
use crate::store::VectorStore;

/// Deadline applied on top of the store client's own timeout.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Canonical retrieval-bias phrases per question intent.
const INTENT_PREFIXES: [(&str, &str); 7] = [
    ("ask_business_hours", "business hours operating hours open close"),
    ("ask_pricing", "pricing cost price fees rates"),
    ("ask_location", "location address directions where find us"),
    ("ask_policy", "policy policies rules terms cancellation"),
    ("ask_services", "services offerings what we provide"),
    ("business_info", "about the business company information"),
    ("faq", "frequently asked questions common answers"),
];

/// Search tuning knobs.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Collection holding the knowledge base.
    pub collection: String,
    /// Number of results returned to the caller.
    pub top_k: usize,
    /// Minimum similarity score a result must reach to be kept.
    pub min_score: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            collection: "business_kb".to_string(),
            top_k: 3,
            min_score: 0.3,
        }
    }
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// Chunk text.
    pub text: String,
    /// Source label from the chunk's metadata.
    pub source: String,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    /// Full metadata map.
    pub metadata: Map<String, Value>,
}

/// Retrieval entry point over a vector store.
#[derive(Clone)]
pub struct KnowledgeBase {
    store: Arc<dyn VectorStore>,
    config: SearchConfig,
}

impl KnowledgeBase {
    /// Create a knowledge base over the given store.
    pub fn new(store: Arc<dyn VectorStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// The configured search knobs.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Build the query text for an intent and raw user text.
    #[must_use]
    pub fn build_query(intent: Option<&str>, text: &str) -> String {
        let prefix = intent.and_then(|i| {
            INTENT_PREFIXES
                .iter()
                .find(|(name, _)| *name == i)
                .map(|(_, p)| *p)
        });
        match prefix {
            Some(p) => format!("{p} {text}"),
            None => text.to_string(),
        }
    }

    /// Search the knowledge base.
    ///
    /// Queries `top_k x 2` candidates, converts distances to scores,
    /// drops everything under `min_score`, and returns the best `top_k`
    /// in descending score order.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure or when the search deadline
    /// elapses.
    pub async fn search(
        &self,
        intent: Option<&str>,
        text: &str,
        where_filter: Option<&Map<String, Value>>,
    ) -> RetrievalResult<Vec<ScoredChunk>> {
        let query = Self::build_query(intent, text);
        let n_results = self.config.top_k.saturating_mul(2);

        debug!(collection = %self.config.collection, %query, "knowledge base search");

        let result = tokio::time::timeout(
            SEARCH_TIMEOUT,
            self.store
                .query(&self.config.collection, &[query], n_results, where_filter),
        )
        .await
        .map_err(|_| RetrievalError::Timeout)??;

        let documents = result.documents.into_iter().next().unwrap_or_default();
        let metadatas = result.metadatas.into_iter().next().unwrap_or_default();
        let distances = result.distances.into_iter().next().unwrap_or_default();

        let mut chunks: Vec<ScoredChunk> = documents
            .into_iter()
            .zip(distances)
            .enumerate()
            .map(|(i, (text, distance))| {
                let metadata = metadatas.get(i).cloned().unwrap_or_default();
                let source = metadata
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or("knowledge base")
                    .to_string();
                ScoredChunk {
                    text,
                    source,
                    score: (1.0 - distance / 2.0).clamp(0.0, 1.0),
                    metadata,
                }
            })
            .filter(|c| c.score >= self.config.min_score)
            .collect();

        chunks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        chunks.truncate(self.config.top_k);
        Ok(chunks)
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryVectorStore;

    fn meta(source: &str) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("source".to_string(), Value::String(source.to_string()));
        m
    }

    async fn seeded_kb() -> KnowledgeBase {
        let store = MemoryVectorStore::new();
        store
            .add(
                "business_kb",
                &["c1".to_string(), "c2".to_string(), "c3".to_string()],
                &[
                    "We are open monday through friday 9am to 6pm business hours".to_string(),
                    "Consultation pricing starts at 50 dollars per hour".to_string(),
                    "Our office is located at 12 Main Street".to_string(),
                ],
                &[meta("hours.md"), meta("pricing.md"), meta("location.md")],
            )
            .await
            .unwrap();
        KnowledgeBase::new(Arc::new(store), SearchConfig::default())
    }

    #[test]
    fn test_query_prefix_for_known_intent() {
        let query = KnowledgeBase::build_query(Some("ask_business_hours"), "when are you open?");
        assert!(query.starts_with("business hours operating hours open close"));
        assert!(query.ends_with("when are you open?"));
    }

    #[test]
    fn test_raw_query_for_unknown_intent() {
        let query = KnowledgeBase::build_query(Some("chitchat"), "tell me a joke");
        assert_eq!(query, "tell me a joke");
        assert_eq!(KnowledgeBase::build_query(None, "hello"), "hello");
    }

    #[tokio::test]
    async fn test_search_scores_and_ranks() {
        let kb = seeded_kb().await;
        let chunks = kb
            .search(Some("ask_business_hours"), "when are you open", None)
            .await
            .unwrap();

        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].source, "hours.md");
        assert!(chunks[0].score > 0.5);
        for pair in chunks.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_min_score_filters() {
        let kb = seeded_kb().await;
        let chunks = kb
            .search(None, "completely unrelated quantum physics homework", None)
            .await
            .unwrap();
        assert!(chunks.iter().all(|c| c.score >= 0.3));
    }

    #[tokio::test]
    async fn test_top_k_truncation() {
        let store = MemoryVectorStore::new();
        let ids: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
        let docs: Vec<String> = (0..10).map(|i| format!("open hours document {i}")).collect();
        let metas: Vec<Map<String, Value>> = (0..10).map(|_| meta("m.md")).collect();
        store.add("business_kb", &ids, &docs, &metas).await.unwrap();

        let kb = KnowledgeBase::new(Arc::new(store), SearchConfig::default());
        let chunks = kb.search(None, "open hours document", None).await.unwrap();
        assert_eq!(chunks.len(), 3);
    }
}
