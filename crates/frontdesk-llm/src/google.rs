//! Google adapter.
//!
//! The generative language API carries the system prompt in a
//! `system_instruction` field and uses `user`/`model` content roles; the
//! assistant role is remapped to `model`.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{LlmError, LlmResult};
use crate::openai::map_transport;
use crate::profile::LlmProfile;
use crate::types::{ChatMessage, ChatRole, Generation, Usage};

const GOOGLE_API_URL: &str = "https://generativelanguage.googleapis.com";

const HOSTED_TIMEOUT: Duration = Duration::from_secs(30);

/// Adapter for the Google generative language API.
pub struct GoogleAdapter {
    client: Client,
    profile: LlmProfile,
    base_url: String,
}

impl GoogleAdapter {
    /// Build an adapter from a profile.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ApiKeyNotConfigured`] when no key is set.
    pub fn from_profile(profile: LlmProfile) -> LlmResult<Self> {
        if profile.api_key.as_deref().unwrap_or_default().is_empty() {
            return Err(LlmError::ApiKeyNotConfigured {
                provider: "google".to_string(),
            });
        }
        let base_url = profile
            .base_url
            .clone()
            .unwrap_or_else(|| GOOGLE_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder().timeout(HOSTED_TIMEOUT).build()?;
        Ok(Self {
            client,
            profile,
            base_url,
        })
    }

    /// Build the request body.
    fn build_request(&self, messages: &[ChatMessage]) -> Value {
        let system = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| {
                serde_json::json!({
                    "role": match m.role {
                        ChatRole::Assistant => "model",
                        _ => "user",
                    },
                    "parts": [{"text": m.content}],
                })
            })
            .collect();

        let mut request = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.profile.temperature,
                "maxOutputTokens": self.profile.max_tokens,
            },
        });
        if !system.is_empty() {
            request["system_instruction"] = serde_json::json!({"parts": [{"text": system}]});
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
        let key = self.profile.api_key.as_deref().unwrap_or_default();
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={key}",
            self.base_url, self.profile.model,
        );

        debug!(model = %self.profile.model, "google request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "google API error");
            return Err(LlmError::ApiRequestFailed(format!("status {status}: {body}")));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| LlmError::InvalidResponse("no candidates".to_string()))?;
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("no text parts".to_string()));
        }

        let usage = parsed.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
        });

        Ok(Generation::ok(&self.profile.model, text, usage))
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProviderKind;
    use crate::types::build_messages;
    use httpmock::prelude::*;

    fn profile() -> LlmProfile {
        LlmProfile::new(ProviderKind::Google, "gemini-1.5-flash").api_key("g-key")
    }

    #[test]
    fn test_assistant_role_remapped() {
        let adapter = GoogleAdapter::from_profile(profile()).unwrap();
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];
        let body = adapter.build_request(&messages);

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(body["system_instruction"]["parts"][0]["text"], "sys");
    }

    #[tokio::test]
    async fn test_generate_parses_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-1.5-flash:generateContent")
                .query_param("key", "g-key");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "We open at 9."}]}}],
                "usageMetadata": {"promptTokenCount": 11, "candidatesTokenCount": 5},
            }));
        });

        let adapter = GoogleAdapter::from_profile(profile().base_url(server.base_url())).unwrap();
        let generation = adapter
            .generate(&build_messages("sys", "", "when do you open"))
            .await
            .unwrap();

        assert!(generation.success);
        assert_eq!(generation.response.as_deref(), Some("We open at 9."));
        assert_eq!(generation.usage.unwrap().prompt_tokens, 11);
    }
}
