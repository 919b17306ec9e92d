//! Layered configuration cache.
//!
//! Read path for any key:
//! 1. process-local map, if the entry is younger than the TTL
//! 2. shared cache (`config:<key>`), parsed and used to refresh the local map
//! 3. authoritative admin endpoint (5 s timeout), populating both caches
//! 4. built-in defaults
//!
//! Consumers receive immutable `Arc` snapshots. Defaults are never cached,
//! so an admin store that comes back is picked up on the next read. Writes
//! happen elsewhere; the admin layer calls [`ConfigCache::invalidate`]
//! after editing, which drops both cache layers for the key.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::admin::AdminApi;
use crate::error::ConfigResult;
use crate::shared::SharedCache;
use crate::types::{BotConfig, LlmConfig, LlmConfigView, TaskConfig, TaskKind};

/// Default freshness window for local entries.
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Environment variables consulted for the LLM API key, in order, when the
/// stored configuration has none (the admin read path masks keys).
const LLM_KEY_ENV_VARS: [&str; 5] = [
    "FRONTDESK_LLM_API_KEY",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GOOGLE_API_KEY",
    "AZURE_OPENAI_API_KEY",
];

#[derive(Clone)]
enum Snapshot {
    Task(Arc<TaskConfig>),
    Bot(Arc<BotConfig>),
    Llm(Arc<LlmConfig>),
}

struct CacheEntry {
    snapshot: Snapshot,
    fetched_at: Instant,
}

/// Options for constructing a [`ConfigCache`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Base URL of the authoritative admin read API. `None` disables the
    /// admin layer (reads fall through to defaults).
    pub admin_base_url: Option<String>,
    /// Per-entry freshness window.
    pub ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            admin_base_url: None,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheOptions {
    /// Read options from the environment (`ADMIN_API_URL`,
    /// `CONFIG_CACHE_TTL_SECS`).
    #[must_use]
    pub fn from_env() -> Self {
        let admin_base_url = std::env::var("ADMIN_API_URL").ok();
        let ttl = std::env::var("CONFIG_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(DEFAULT_TTL, Duration::from_secs);
        Self {
            admin_base_url,
            ttl,
        }
    }
}

/// The layered configuration cache.
pub struct ConfigCache {
    local: DashMap<String, CacheEntry>,
    shared: Arc<dyn SharedCache>,
    admin: Option<AdminApi>,
    ttl: Duration,
}

impl ConfigCache {
    /// Create a cache over the given shared backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the admin HTTP client cannot be constructed.
    pub fn new(shared: Arc<dyn SharedCache>, options: CacheOptions) -> ConfigResult<Self> {
        let admin = match options.admin_base_url {
            Some(url) => Some(AdminApi::new(url)?),
            None => None,
        };
        Ok(Self {
            local: DashMap::new(),
            shared,
            admin,
            ttl: options.ttl,
        })
    }

    /// Create a self-contained cache with an in-memory shared layer and no
    /// admin endpoint. Every read resolves to defaults until something is
    /// placed in the shared layer.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            local: DashMap::new(),
            shared: Arc::new(crate::shared::MemorySharedCache::new()),
            admin: None,
            ttl: DEFAULT_TTL,
        }
    }

    fn fresh_local(&self, key: &str) -> Option<Snapshot> {
        let entry = self.local.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    fn store_local(&self, key: &str, snapshot: Snapshot) {
        self.local.insert(
            key.to_string(),
            CacheEntry {
                snapshot,
                fetched_at: Instant::now(),
            },
        );
    }

    async fn store_shared(&self, key: &str, doc: &serde_json::Value) {
        if let Err(e) = self.shared.set(key, doc.to_string()).await {
            warn!(key, error = %e, "shared cache write failed");
        }
    }

    /// Get the configuration snapshot for a task. Falls back to the
    /// built-in default when every layer misses; a missing config means
    /// the task is enabled.
    pub async fn get_task_config(&self, kind: TaskKind) -> Arc<TaskConfig> {
        let local_key = format!("task/{kind}");
        if let Some(Snapshot::Task(config)) = self.fresh_local(&local_key) {
            return config;
        }

        let shared_key = format!("config:{local_key}");
        match self.shared.get(&shared_key).await {
            Ok(Some(json)) => match parse_task(kind, &json) {
                Ok(config) => {
                    let config = Arc::new(config);
                    self.store_local(&local_key, Snapshot::Task(config.clone()));
                    return config;
                },
                Err(e) => warn!(key = %shared_key, error = %e, "stale shared config ignored"),
            },
            Ok(None) => {},
            Err(e) => warn!(key = %shared_key, error = %e, "shared cache read failed"),
        }

        if let Some(admin) = &self.admin {
            match admin.get_task(kind.as_str()).await {
                Ok(doc) => match TaskConfig::from_admin_json(kind, &doc) {
                    Ok(config) => {
                        debug!(task = %kind, "task config loaded from admin");
                        self.store_shared(&shared_key, &doc).await;
                        let config = Arc::new(config);
                        self.store_local(&local_key, Snapshot::Task(config.clone()));
                        return config;
                    },
                    Err(e) => warn!(task = %kind, error = %e, "admin task config malformed"),
                },
                Err(e) => warn!(task = %kind, error = %e, "task config unreachable; using defaults"),
            }
        }

        Arc::new(kind.default_config())
    }

    /// Get the bot identity configuration.
    pub async fn get_bot_config(&self) -> Arc<BotConfig> {
        if let Some(Snapshot::Bot(config)) = self.fresh_local("bot") {
            return config;
        }

        match self.shared.get("config:bot").await {
            Ok(Some(json)) => match serde_json::from_str::<BotConfig>(&json) {
                Ok(config) => {
                    let config = Arc::new(config);
                    self.store_local("bot", Snapshot::Bot(config.clone()));
                    return config;
                },
                Err(e) => warn!(error = %e, "stale shared bot config ignored"),
            },
            Ok(None) => {},
            Err(e) => warn!(error = %e, "shared cache read failed"),
        }

        if let Some(admin) = &self.admin {
            match admin.get_bot().await {
                Ok(doc) => match serde_json::from_value::<BotConfig>(doc.clone()) {
                    Ok(config) => {
                        self.store_shared("config:bot", &doc).await;
                        let config = Arc::new(config);
                        self.store_local("bot", Snapshot::Bot(config.clone()));
                        return config;
                    },
                    Err(e) => warn!(error = %e, "admin bot config malformed"),
                },
                Err(e) => warn!(error = %e, "bot config unreachable; using defaults"),
            }
        }

        Arc::new(BotConfig::default())
    }

    /// Get the LLM configuration with the raw key resolved for in-process
    /// use. The admin read path masks keys, so a missing key is filled
    /// from the environment when possible.
    pub async fn get_llm_config(&self) -> Arc<LlmConfig> {
        if let Some(Snapshot::Llm(config)) = self.fresh_local("llm") {
            return config;
        }

        match self.shared.get("config:llm").await {
            Ok(Some(json)) => match parse_llm(&json) {
                Ok(config) => {
                    let config = Arc::new(config);
                    self.store_local("llm", Snapshot::Llm(config.clone()));
                    return config;
                },
                Err(e) => warn!(error = %e, "stale shared llm config ignored"),
            },
            Ok(None) => {},
            Err(e) => warn!(error = %e, "shared cache read failed"),
        }

        if let Some(admin) = &self.admin {
            match admin.get_llm().await {
                Ok(doc) => match parse_llm(&doc.to_string()) {
                    Ok(config) => {
                        self.store_shared("config:llm", &doc).await;
                        let config = Arc::new(config);
                        self.store_local("llm", Snapshot::Llm(config.clone()));
                        return config;
                    },
                    Err(e) => warn!(error = %e, "admin llm config malformed"),
                },
                Err(e) => warn!(error = %e, "llm config unreachable; using defaults"),
            }
        }

        let mut config = LlmConfig::default();
        resolve_api_key(&mut config);
        Arc::new(config)
    }

    /// Dashboard-facing LLM configuration with the key masked.
    pub async fn get_llm_config_masked(&self) -> LlmConfigView {
        self.get_llm_config().await.masked()
    }

    /// Drop both cache layers for a key (`task/<name>`, `bot`, `llm`).
    /// Called by the admin layer after a write.
    pub async fn invalidate(&self, key: &str) {
        self.local.remove(key);
        let shared_key = format!("config:{key}");
        if let Err(e) = self.shared.delete(&shared_key).await {
            warn!(key = %shared_key, error = %e, "shared cache delete failed");
        }
    }

    /// Drop every cached config entry in both layers.
    pub async fn invalidate_all(&self) {
        self.local.clear();
        if let Err(e) = self.shared.delete_prefix("config:").await {
            warn!(error = %e, "shared cache bulk delete failed");
        }
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("entries", &self.local.len())
            .field("ttl", &self.ttl)
            .field("has_admin", &self.admin.is_some())
            .finish()
    }
}

fn parse_task(kind: TaskKind, json: &str) -> ConfigResult<TaskConfig> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| crate::error::ConfigError::Parse {
            key: format!("task/{kind}"),
            message: e.to_string(),
        })?;
    TaskConfig::from_admin_json(kind, &value)
}

fn parse_llm(json: &str) -> ConfigResult<LlmConfig> {
    let config: LlmConfig =
        serde_json::from_str(json).map_err(|e| crate::error::ConfigError::Parse {
            key: "llm".to_string(),
            message: e.to_string(),
        })?;
    config.validate()?;
    let mut config = config;
    resolve_api_key(&mut config);
    Ok(config)
}

/// Fill a missing API key from the environment. The stored document masks
/// keys on the read path; the raw key lives in process environment.
fn resolve_api_key(config: &mut LlmConfig) {
    if config.api_key.is_some() {
        return;
    }
    for var in LLM_KEY_ENV_VARS {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                config.api_key = Some(key);
                return;
            }
        }
    }
}
