//! Provider profile.
//!
//! A profile is everything an adapter needs to talk to its provider. The
//! runtime builds one from the cached LLM configuration snapshot.

/// Which provider family to dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI chat completions.
    OpenAi,
    /// Azure-hosted OpenAI variant (endpoint + api-version; the
    /// deployment name rides in `model`).
    Azure,
    /// Anthropic messages API.
    Anthropic,
    /// Google generative language API.
    Google,
    /// Local Ollama server.
    Ollama,
    /// Any OpenAI-compatible endpoint.
    Custom,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

/// Configuration for one provider.
#[derive(Clone)]
pub struct LlmProfile {
    /// Provider family.
    pub provider: ProviderKind,
    /// Model id (Azure: deployment name).
    pub model: String,
    /// API key, where the provider wants one.
    pub api_key: Option<String>,
    /// Endpoint override (Azure resource URL, Ollama host, custom base).
    pub base_url: Option<String>,
    /// Azure API version.
    pub api_version: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// System prompt for every request.
    pub system_prompt: String,
}

impl LlmProfile {
    /// Create a profile with default sampling settings.
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: None,
            base_url: None,
            api_version: None,
            temperature: 0.7,
            max_tokens: 500,
            system_prompt: String::new(),
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the endpoint override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the Azure API version.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the completion token cap.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

impl std::fmt::Debug for LlmProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProfile")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps_temperature() {
        let profile = LlmProfile::new(ProviderKind::OpenAi, "gpt-4o-mini").temperature(3.5);
        assert!((profile.temperature - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_debug_hides_key() {
        let profile = LlmProfile::new(ProviderKind::Anthropic, "claude-3-haiku")
            .api_key("sk-ant-secret");
        let debug = format!("{profile:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("has_api_key: true"));
    }
}
