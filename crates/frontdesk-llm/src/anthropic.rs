//! Anthropic adapter.
//!
//! The messages API takes the system prompt as a separate parameter, so
//! system messages are lifted out of the sequence and joined with
//! newlines; only user/assistant turns go into `messages`.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{LlmError, LlmResult};
use crate::openai::{map_transport, sensitive};
use crate::profile::LlmProfile;
use crate::types::{ChatMessage, ChatRole, Generation, Usage};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const HOSTED_TIMEOUT: Duration = Duration::from_secs(30);

/// Adapter for the Anthropic messages API.
#[derive(Debug)]
pub struct AnthropicAdapter {
    client: Client,
    profile: LlmProfile,
    endpoint: String,
}

impl AnthropicAdapter {
    /// Build an adapter from a profile.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ApiKeyNotConfigured`] when no key is set.
    pub fn from_profile(profile: LlmProfile) -> LlmResult<Self> {
        if profile.api_key.as_deref().unwrap_or_default().is_empty() {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "anthropic".to_string(),
            });
        }
        let endpoint = profile
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());
        let client = Client::builder().timeout(HOSTED_TIMEOUT).build()?;
        Ok(Self {
            client,
            profile,
            endpoint,
        })
    }

    /// Build the request body. Multiple system messages are concatenated
    /// with `\n` into the `system` parameter.
    fn build_request(&self, messages: &[ChatMessage]) -> Value {
        let system = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let api_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| {
                serde_json::json!({
                    "role": match m.role {
                        ChatRole::Assistant => "assistant",
                        _ => "user",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut request = serde_json::json!({
            "model": self.profile.model,
            "max_tokens": self.profile.max_tokens,
            "temperature": self.profile.temperature,
            "messages": api_messages,
        });
        if !system.is_empty() {
            request["system"] = Value::String(system);
        }
        request
    }

    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] on transport failure, non-success status,
    /// or an unparseable body.
    pub async fn generate(&self, messages: &[ChatMessage]) -> LlmResult<Generation> {
        let body = self.build_request(messages);
        debug!(model = %self.profile.model, "anthropic request");

        let key = self.profile.api_key.as_deref().unwrap_or_default();
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", sensitive(key)?)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "anthropic API error");
            return Err(LlmError::ApiRequestFailed(format!("status {status}: {body}")));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("no text content".to_string()));
        }

        let usage = parsed.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
        });

        Ok(Generation::ok(&self.profile.model, text, usage))
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProviderKind;
    use crate::types::build_messages;
    use httpmock::prelude::*;

    fn profile() -> LlmProfile {
        LlmProfile::new(ProviderKind::Anthropic, "claude-3-haiku").api_key("sk-ant-test")
    }

    #[test]
    fn test_missing_key_rejected() {
        let bare = LlmProfile::new(ProviderKind::Anthropic, "claude-3-haiku");
        assert!(matches!(
            AnthropicAdapter::from_profile(bare).unwrap_err(),
            LlmError::ApiKeyNotConfigured { .. }
        ));
    }

    #[test]
    fn test_system_messages_joined() {
        let adapter = AnthropicAdapter::from_profile(profile()).unwrap();
        let body = adapter.build_request(&build_messages("Be helpful.", "We open at 9.", "hi"));

        let system = body["system"].as_str().unwrap();
        assert!(system.starts_with("Be helpful.\nUse this context"));
        // Only the user turn remains in messages.
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[tokio::test]
    async fn test_generate_parses_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("anthropic-version", ANTHROPIC_VERSION);
            then.status(200).json_body(serde_json::json!({
                "content": [{"type": "text", "text": "We open at 9am."}],
                "usage": {"input_tokens": 14, "output_tokens": 7},
            }));
        });

        let adapter = AnthropicAdapter::from_profile(
            profile().base_url(format!("{}/v1/messages", server.base_url())),
        )
        .unwrap();
        let generation = adapter
            .generate(&build_messages("sys", "", "when do you open"))
            .await
            .unwrap();

        assert!(generation.success);
        assert_eq!(generation.response.as_deref(), Some("We open at 9am."));
        assert_eq!(generation.usage.unwrap().prompt_tokens, 14);
    }
}
