//! Authoritative admin read API client.
//!
//! The cache layer is the only consumer. Reads carry a short timeout so a
//! slow admin store degrades into the built-in defaults instead of
//! stalling a turn. This client holds HTTP coordinates only - never a
//! reference to a runtime component.

use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Timeout for authoritative reads.
const ADMIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only client for the admin configuration endpoints.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: reqwest::Client,
    base_url: String,
}

impl AdminApi {
    /// Create a client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AdminRequest`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>) -> ConfigResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(ADMIN_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, path: &str) -> ConfigResult<Value> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "admin config read");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::AdminStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch a task configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn get_task(&self, name: &str) -> ConfigResult<Value> {
        self.get_json(&format!("/api/admin/config/tasks/{name}")).await
    }

    /// Fetch the bot configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn get_bot(&self) -> ConfigResult<Value> {
        self.get_json("/api/admin/config/bot").await
    }

    /// Fetch the LLM configuration document.
    ///
    /// The endpoint wraps the document as `{"config": {...}}`; the inner
    /// object is returned.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn get_llm(&self) -> ConfigResult<Value> {
        let mut envelope = self.get_json("/api/llm/config").await?;
        match envelope.get_mut("config") {
            Some(inner) => Ok(inner.take()),
            None => Ok(envelope),
        }
    }
}
