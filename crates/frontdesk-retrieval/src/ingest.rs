//! Knowledge base ingestion.
//!
//! A simple pre-processor: documents are split into overlapping chunks at
//! sentence boundaries where possible, then upserted into the vector
//! store. Upserts are serialized per collection.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::RetrievalResult;
use crate::store::{DeleteSelector, VectorStore};

/// Chunking parameters (character counts).
#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions {
    /// Target chunk size.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks.
    pub overlap: usize,
    /// Chunks shorter than this are dropped.
    pub min_chunk_size: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
            min_chunk_size: 100,
        }
    }
}

/// A chunk ready for ingestion.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    /// Stable chunk id.
    pub id: String,
    /// Chunk text.
    pub text: String,
    /// Source label.
    pub source: String,
    /// Arbitrary metadata.
    pub metadata: Map<String, Value>,
}

/// Split text into overlapping chunks, preferring sentence boundaries.
///
/// A document shorter than the minimum chunk size still yields one chunk;
/// mid-document fragments below the minimum are dropped.
#[must_use]
pub fn chunk_text(text: &str, options: ChunkOptions) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0_usize;

    while start < chars.len() {
        let hard_end = start.saturating_add(options.chunk_size).min(chars.len());
        let mut end = hard_end;

        if hard_end < chars.len() {
            // Walk back to the nearest sentence boundary that still leaves
            // a usefully sized chunk.
            let min_end = start.saturating_add(options.min_chunk_size);
            let mut i = hard_end;
            while i > min_end {
                let at_boundary = matches!(chars[i.saturating_sub(1)], '.' | '!' | '?')
                    && chars.get(i).is_none_or(|c| c.is_whitespace());
                if at_boundary {
                    end = i;
                    break;
                }
                i = i.saturating_sub(1);
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim().to_string();
        let whole_document = start == 0 && end == chars.len();
        if chunk.chars().count() >= options.min_chunk_size || (whole_document && !chunk.is_empty())
        {
            chunks.push(chunk);
        }

        if end >= chars.len() {
            break;
        }
        start = end.saturating_sub(options.overlap).max(start.saturating_add(1));
    }

    chunks
}

/// Ingestion front door over a vector store.
pub struct Ingester {
    store: Arc<dyn VectorStore>,
    options: ChunkOptions,
    collection_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl Ingester {
    /// Create an ingester with default chunking.
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            options: ChunkOptions::default(),
            collection_locks: DashMap::new(),
        }
    }

    /// Override the chunking parameters.
    #[must_use]
    pub fn with_options(mut self, options: ChunkOptions) -> Self {
        self.options = options;
        self
    }

    fn lock_for(&self, collection: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.collection_locks
            .entry(collection.to_string())
            .or_default()
            .clone()
    }

    /// Chunk a document and upsert it. Returns the stored chunks.
    ///
    /// Upserts into the same collection are serialized; different
    /// collections proceed in parallel.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the upsert.
    pub async fn ingest_document(
        &self,
        collection: &str,
        source: &str,
        text: &str,
        extra_metadata: Map<String, Value>,
    ) -> RetrievalResult<Vec<DocumentChunk>> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        self.store.get_or_create_collection(collection, None).await?;

        let chunks: Vec<DocumentChunk> = chunk_text(text, self.options)
            .into_iter()
            .map(|text| {
                let mut metadata = extra_metadata.clone();
                metadata.insert("source".to_string(), Value::String(source.to_string()));
                DocumentChunk {
                    id: Uuid::new_v4().to_string(),
                    text,
                    source: source.to_string(),
                    metadata,
                }
            })
            .collect();

        if chunks.is_empty() {
            return Ok(chunks);
        }

        let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
        let documents: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let metadatas: Vec<Map<String, Value>> =
            chunks.iter().map(|c| c.metadata.clone()).collect();

        self.store.add(collection, &ids, &documents, &metadatas).await?;
        info!(collection, source, chunks = chunks.len(), "document ingested");
        Ok(chunks)
    }

    /// Remove every chunk previously ingested from a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the delete.
    pub async fn delete_source(&self, collection: &str, source: &str) -> RetrievalResult<()> {
        let lock = self.lock_for(collection);
        let _guard = lock.lock().await;

        let mut filter = Map::new();
        filter.insert("source".to_string(), Value::String(source.to_string()));
        self.store
            .delete(collection, DeleteSelector::Where(filter))
            .await
    }
}

impl std::fmt::Debug for Ingester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingester")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
