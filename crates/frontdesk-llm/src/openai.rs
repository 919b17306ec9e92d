//! OpenAI-compatible adapter.
//!
//! Covers the OpenAI API itself, the Azure-hosted variant (resource
//! endpoint + api-version, deployment name as the model), and any other
//! chat-completions-compatible endpoint.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{LlmError, LlmResult};
use crate::profile::{LlmProfile, ProviderKind};
use crate::types::{ChatMessage, ChatRole, Generation, Usage};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Hosted-provider request deadline.
const HOSTED_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum AuthStyle {
    Bearer(String),
    AzureKey(String),
    None,
}

/// Adapter for OpenAI-shaped chat-completions endpoints.
#[derive(Debug)]
pub struct OpenAiAdapter {
    client: Client,
    profile: LlmProfile,
    endpoint: String,
    auth: AuthStyle,
}

impl OpenAiAdapter {
    /// Build an adapter from a profile.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ApiKeyNotConfigured`] when the provider
    /// requires a key and none is set, or [`LlmError::ConfigError`] when
    /// Azure is selected without an endpoint.
    pub fn from_profile(profile: LlmProfile) -> LlmResult<Self> {
        let (endpoint, auth) = match profile.provider {
            ProviderKind::Azure => {
                let base = profile.base_url.clone().ok_or_else(|| {
                    LlmError::ConfigError("azure provider requires a base_url".to_string())
                })?;
                let key = require_key(&profile)?;
                let api_version = profile
                    .api_version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
                let endpoint = format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={api_version}",
                    base.trim_end_matches('/'),
                    profile.model,
                );
                (endpoint, AuthStyle::AzureKey(key))
            },
            ProviderKind::OpenAi => {
                let key = require_key(&profile)?;
                let endpoint = profile
                    .base_url
                    .clone()
                    .map_or(DEFAULT_OPENAI_URL.to_string(), |base| {
                        chat_completions_url(&base)
                    });
                (endpoint, AuthStyle::Bearer(key))
            },
            _ => {
                // Custom: endpoint required, key optional.
                let base = profile.base_url.clone().ok_or_else(|| {
                    LlmError::ConfigError("custom provider requires a base_url".to_string())
                })?;
                let auth = match &profile.api_key {
                    Some(key) => AuthStyle::Bearer(key.clone()),
                    None => AuthStyle::None,
                };
                (chat_completions_url(&base), auth)
            },
        };

        let client = Client::builder().timeout(HOSTED_TIMEOUT).build()?;
        Ok(Self {
            client,
            profile,
            endpoint,
            auth,
        })
    }

    /// Build the request body.
    fn build_request(&self, messages: &[ChatMessage]) -> Value {
        let api_messages: Vec<Value> = messages
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

        serde_json::json!({
            "model": self.profile.model,
            "messages": api_messages,
            "max_tokens": self.profile.max_tokens,
            "temperature": self.profile.temperature,
        })
    }

    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] on transport failure, non-success status,
    /// or an unparseable body.
    pub async fn generate(&self, messages: &[ChatMessage]) -> LlmResult<Generation> {
        let body = self.build_request(messages);
        debug!(model = %self.profile.model, "openai-compatible request");

        let mut request = self.client.post(&self.endpoint).json(&body);
        match &self.auth {
            AuthStyle::Bearer(key) => {
                request = request.header("Authorization", sensitive(&format!("Bearer {key}"))?);
            },
            AuthStyle::AzureKey(key) => {
                request = request.header("api-key", sensitive(key)?);
            },
            AuthStyle::None => {},
        }

        let response = request.send().await.map_err(map_transport)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "openai-compatible API error");
            return Err(LlmError::ApiRequestFailed(format!("status {status}: {body}")));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let usage = parsed.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });

        Ok(Generation::ok(&self.profile.model, text, usage))
    }
}

fn require_key(profile: &LlmProfile) -> LlmResult<String> {
    profile
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| LlmError::ApiKeyNotConfigured {
            provider: profile.provider.to_string(),
        })
}

fn chat_completions_url(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/chat/completions")
    }
}

pub(crate) fn sensitive(value: &str) -> LlmResult<reqwest::header::HeaderValue> {
    let mut header = reqwest::header::HeaderValue::try_from(value)
        .map_err(|e| LlmError::ConfigError(format!("invalid header characters: {e}")))?;
    header.set_sensitive(true);
    Ok(header)
}

pub(crate) fn map_transport(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else if e.is_connect() {
        LlmError::Connection(e.to_string())
    } else {
        LlmError::Http(e)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
