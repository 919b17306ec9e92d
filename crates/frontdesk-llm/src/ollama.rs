//! Local Ollama adapter.
//!
//! Talks to a local Ollama server via `POST /api/chat` with
//! `stream=false`. If the target model is not present in `/api/tags`, a
//! `/api/pull` is issued first with a long deadline. Inference gets a
//! 2-minute deadline; an unreachable host surfaces a connect error.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{LlmError, LlmResult};
use crate::profile::LlmProfile;
use crate::types::{ChatMessage, ChatRole, Generation, Usage};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Local model inference deadline.
const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

/// Model download deadline.
const PULL_TIMEOUT: Duration = Duration::from_secs(600);

/// Adapter for a local Ollama server.
pub struct OllamaAdapter {
    chat_client: Client,
    pull_client: Client,
    profile: LlmProfile,
    base_url: String,
}

impl OllamaAdapter {
    /// Build an adapter from a profile. No key is required.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_profile(profile: LlmProfile) -> LlmResult<Self> {
        let base_url = profile
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let chat_client = Client::builder().timeout(CHAT_TIMEOUT).build()?;
        let pull_client = Client::builder().timeout(PULL_TIMEOUT).build()?;
        Ok(Self {
            chat_client,
            pull_client,
            profile,
            base_url,
        })
    }

    /// Check `/api/tags` for the model; pull it when absent.
    async fn ensure_model(&self) -> LlmResult<()> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .chat_client
            .get(&url)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if response.status().is_success() {
            let tags: TagsResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
            let present = tags.models.iter().any(|m| {
                m.name == self.profile.model
                    || m.name
                        .strip_suffix(":latest")
                        .is_some_and(|base| base == self.profile.model)
            });
            if present {
                return Ok(());
            }
        } else {
            warn!(status = %response.status(), "ollama tags listing failed; attempting pull");
        }

        info!(model = %self.profile.model, "pulling ollama model");
        let pull_url = format!("{}/api/pull", self.base_url);
        let response = self
            .pull_client
            .post(&pull_url)
            .json(&serde_json::json!({"name": self.profile.model, "stream": false}))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Connection(e.to_string())
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::ModelNotAvailable {
                model: self.profile.model.clone(),
            })
        }
    }

    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] when the host is unreachable, the model
    /// cannot be pulled, or the response cannot be parsed.
    pub async fn generate(&self, messages: &[ChatMessage]) -> LlmResult<Generation> {
        self.ensure_model().await?;

        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": match m.role {
                        ChatRole::System => "system",
                        ChatRole::User => "user",
                        ChatRole::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": self.profile.model,
            "messages": api_messages,
            "stream": false,
            "options": {
                "temperature": self.profile.temperature,
                "num_predict": self.profile.max_tokens,
            },
        });

        debug!(model = %self.profile.model, "ollama chat request");
        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .chat_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Connection(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiRequestFailed(format!("status {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let usage = Some(Usage {
            prompt_tokens: parsed.prompt_eval_count.unwrap_or_default(),
            completion_tokens: parsed.eval_count.unwrap_or_default(),
        });

        Ok(Generation::ok(
            &self.profile.model,
            parsed.message.content,
            usage,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}
