//! Message and result types shared by every provider adapter.

use serde::{Deserialize, Serialize};

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions to the model.
    System,
    /// End-user text.
    User,
    /// Model output.
    Assistant,
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Build the canonical request sequence: the configured system prompt,
/// an optional second system message framing retrieval context, then the
/// user text.
#[must_use]
pub fn build_messages(system_prompt: &str, context: &str, user_text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(3);
    if !system_prompt.is_empty() {
        messages.push(ChatMessage::system(system_prompt));
    }
    if !context.is_empty() {
        messages.push(ChatMessage::system(format!(
            "Use this context to answer the user's question:\n\n{context}"
        )));
    }
    messages.push(ChatMessage::user(user_text));
    messages
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Input/prompt tokens.
    pub prompt_tokens: u64,
    /// Output/completion tokens.
    pub completion_tokens: u64,
}

/// The unified generation result.
///
/// Provider failures are carried inside (`success: false` plus `error`);
/// they never propagate past the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Whether generation succeeded.
    pub success: bool,
    /// Generated text, on success.
    pub response: Option<String>,
    /// Model that served (or would have served) the request.
    pub model: String,
    /// Token usage, when the provider reported it.
    pub usage: Option<Usage>,
    /// Failure reason.
    pub error: Option<String>,
}

impl Generation {
    /// A successful generation.
    #[must_use]
    pub fn ok(model: impl Into<String>, response: impl Into<String>, usage: Option<Usage>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            model: model.into(),
            usage,
            error: None,
        }
    }

    /// A contained failure.
    #[must_use]
    pub fn failure(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            model: model.into(),
            usage: None,
            error: Some(error.into()),
        }
    }
}
