#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Frontdesk Retrieval - grounded question answering over a vector store.
//!
//! This crate provides:
//! - The minimal vector store contract (query/upsert/delete) with HTTP
//!   and in-memory implementations
//! - Intent-biased query construction and similarity scoring
//! - Guardrails: confidence thresholds, a relevance heuristic, prompt
//!   injection and sensitive-data refusals, and numeric validation of
//!   LLM-composed answers
//! - Grounded answer composition with source citation
//! - A sliding-window sentence-boundary chunker for ingestion
//!
//! # Pipeline
//!
//! ```text
//! question ─▶ KnowledgeBase::search ─▶ Guardrails::evaluate ─▶ compose
//!                                           │
//!                                           └▶ refusal / clarification
//! ```
//!
//! A refusal or an "unknown" signal is returned instead of an answer
//! whenever grounding is insufficient; the caller decides whether to fall
//! back to an LLM.

mod answer;
mod error;
mod guardrails;
mod ingest;
mod search;
mod store;

pub use answer::{GroundedAnswer, compose};
pub use error::{RetrievalError, RetrievalResult};
pub use guardrails::{
    ConfidenceLevel, GuardrailConfig, Guardrails, RefusalKind, ResponseValidation, Verdict,
};
pub use ingest::{ChunkOptions, DocumentChunk, Ingester, chunk_text};
pub use search::{KnowledgeBase, ScoredChunk, SearchConfig};
pub use store::{DeleteSelector, HttpVectorStore, MemoryVectorStore, QueryResult, VectorStore};
