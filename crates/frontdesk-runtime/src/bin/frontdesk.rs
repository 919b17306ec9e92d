//! Line-oriented turn runner.
//!
//! Wires the runtime from the environment, installs the process log
//! formatter, then reads one JSON turn input per stdin line and writes
//! one JSON turn output per line. The chat transport sits in front of
//! this; the runner is the single-node deployment and ops harness.
//!
//! Environment:
//! - `ADMIN_API_URL`, `CONFIG_CACHE_TTL_SECS` - config cache
//! - `BACKEND_API_URL`, `BACKEND_JWT_TOKEN` / `BACKEND_API_KEY` - backend
//! - `VECTOR_STORE_URL`, `KB_COLLECTION` - knowledge base
//! - `HIGH/MEDIUM/LOW_CONFIDENCE_THRESHOLD` - guardrails
//! - `AUDIT_LOG_DIR` - durable audit sink (default `logs/`)
//! - `RUST_LOG` - log filter

use std::io::BufRead;
use std::sync::Arc;

use frontdesk_audit::{AuditLog, FileSink};
use frontdesk_backend::{BackendAuth, BackendClient};
use frontdesk_config::{CacheOptions, ConfigCache, MemorySharedCache};
use frontdesk_retrieval::{
    GuardrailConfig, Guardrails, HttpVectorStore, KnowledgeBase, MemoryVectorStore, SearchConfig,
    VectorStore,
};
use frontdesk_runtime::{ActionContext, DialogueRuntime, SystemClock, TurnInput};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(ConfigCache::new(
        Arc::new(MemorySharedCache::new()),
        CacheOptions::from_env(),
    )?);

    let backend = Arc::new(match BackendClient::from_env() {
        Ok(client) => client,
        Err(_) => {
            warn!("BACKEND_API_URL not set; using http://localhost:8000");
            BackendClient::new("http://localhost:8000", BackendAuth::None)?
        },
    });

    let store: Arc<dyn VectorStore> = match std::env::var("VECTOR_STORE_URL") {
        Ok(url) => Arc::new(HttpVectorStore::new(url)?),
        Err(_) => {
            warn!("VECTOR_STORE_URL not set; using an empty in-memory store");
            Arc::new(MemoryVectorStore::new())
        },
    };
    let mut search = SearchConfig::default();
    if let Ok(collection) = std::env::var("KB_COLLECTION") {
        search.collection = collection;
    }
    let knowledge = Arc::new(KnowledgeBase::new(store, search));

    let audit_dir = std::env::var("AUDIT_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let audit = AuditLog::new(Arc::new(FileSink::new(audit_dir)));

    let runtime = DialogueRuntime::new(ActionContext::new(
        config,
        backend,
        knowledge,
        Guardrails::new(GuardrailConfig::from_env()),
        audit,
        Arc::new(SystemClock),
    ));

    info!("frontdesk runner ready; one JSON turn per line");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let input: TurnInput = match serde_json::from_str(&line) {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "malformed turn input; skipping");
                continue;
            },
        };
        let output = runtime.handle_turn(input).await;
        println!("{}", serde_json::to_string(&output)?);
    }

    Ok(())
}
