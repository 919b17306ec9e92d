//! The provider-neutral dispatcher.
//!
//! A tagged variant over the adapters with a single `generate`
//! capability. Every provider error or timeout is caught here and
//! converted into a failed [`Generation`]; nothing escapes to the
//! transport.

use tracing::warn;

use crate::anthropic::AnthropicAdapter;
use crate::error::LlmResult;
use crate::google::GoogleAdapter;
use crate::ollama::OllamaAdapter;
use crate::openai::OpenAiAdapter;
use crate::profile::{LlmProfile, ProviderKind};
use crate::types::{Generation, build_messages};

enum ProviderAdapter {
    OpenAi(OpenAiAdapter),
    Anthropic(AnthropicAdapter),
    Google(GoogleAdapter),
    Ollama(OllamaAdapter),
}

/// Dispatches generation requests to the configured provider.
pub struct LlmDispatcher {
    adapter: ProviderAdapter,
    model: String,
    system_prompt: String,
}

impl LlmDispatcher {
    /// Build a dispatcher from a profile.
    ///
    /// # Errors
    ///
    /// Returns an error when the profile is unusable (missing key or
    /// endpoint). Construction errors are the one thing callers see as a
    /// `Result`; once built, `generate` never fails outward.
    pub fn from_profile(profile: LlmProfile) -> LlmResult<Self> {
        let model = profile.model.clone();
        let system_prompt = profile.system_prompt.clone();
        let adapter = match profile.provider {
            ProviderKind::OpenAi | ProviderKind::Azure | ProviderKind::Custom => {
                ProviderAdapter::OpenAi(OpenAiAdapter::from_profile(profile)?)
            },
            ProviderKind::Anthropic => {
                ProviderAdapter::Anthropic(AnthropicAdapter::from_profile(profile)?)
            },
            ProviderKind::Google => ProviderAdapter::Google(GoogleAdapter::from_profile(profile)?),
            ProviderKind::Ollama => ProviderAdapter::Ollama(OllamaAdapter::from_profile(profile)?),
        };
        Ok(Self {
            adapter,
            model,
            system_prompt,
        })
    }

    /// The model this dispatcher targets.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a reply to `user_text`, optionally grounded in retrieval
    /// `context`. Never fails; provider errors come back as
    /// `success: false`.
    pub async fn generate(&self, user_text: &str, context: &str) -> Generation {
        let messages = build_messages(&self.system_prompt, context, user_text);

        let result = match &self.adapter {
            ProviderAdapter::OpenAi(a) => a.generate(&messages).await,
            ProviderAdapter::Anthropic(a) => a.generate(&messages).await,
            ProviderAdapter::Google(a) => a.generate(&messages).await,
            ProviderAdapter::Ollama(a) => a.generate(&messages).await,
        };

        match result {
            Ok(generation) => generation,
            Err(e) => {
                warn!(model = %self.model, error = %e, "llm generation failed");
                Generation::failure(&self.model, e.to_string())
            },
        }
    }
}

impl std::fmt::Debug for LlmDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provider = match self.adapter {
            ProviderAdapter::OpenAi(_) => "openai-compatible",
            ProviderAdapter::Anthropic(_) => "anthropic",
            ProviderAdapter::Google(_) => "google",
            ProviderAdapter::Ollama(_) => "ollama",
        };
        f.debug_struct("LlmDispatcher")
            .field("provider", &provider)
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_provider_error_contained() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).body("internal");
        });

        let profile = LlmProfile::new(ProviderKind::Custom, "local").base_url(server.base_url());
        let dispatcher = LlmDispatcher::from_profile(profile).unwrap();
        let generation = dispatcher.generate("hello", "").await;

        assert!(!generation.success);
        assert!(generation.error.is_some());
        assert_eq!(generation.model, "local");
    }

    #[tokio::test]
    async fn test_unreachable_provider_contained() {
        let profile =
            LlmProfile::new(ProviderKind::Custom, "local").base_url("http://127.0.0.1:1");
        let dispatcher = LlmDispatcher::from_profile(profile).unwrap();
        let generation = dispatcher.generate("hello", "").await;
        assert!(!generation.success);
    }

    #[tokio::test]
    async fn test_context_threaded_through() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Use this context to answer the user's question:");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}],
            }));
        });

        let profile = LlmProfile::new(ProviderKind::Custom, "local")
            .base_url(server.base_url())
            .system_prompt("Be helpful.");
        let dispatcher = LlmDispatcher::from_profile(profile).unwrap();
        let generation = dispatcher.generate("when do you open", "We open at 9.").await;

        assert!(generation.success);
        mock.assert();
    }
}
