#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Frontdesk LLM - provider-neutral generation dispatch.
//!
//! This crate provides a single `generate(user_text, context)` capability
//! over heterogeneous providers: OpenAI-like endpoints (including the
//! Azure variant and arbitrary compatible servers), Anthropic, Google,
//! and a local Ollama server.
//!
//! Every request is built as the same 3-role sequence - the configured
//! system prompt, an optional second system message framing retrieval
//! context, and the user text - then translated into each provider's wire
//! format by a small adapter.
//!
//! # Failure containment
//!
//! [`LlmDispatcher::generate`] never returns an error. Provider failures,
//! timeouts, and unreachable hosts are converted into a
//! [`Generation`] with `success: false` and a reason, so a broken LLM
//! configuration can never take a conversation down.
//!
//! # Example
//!
//! ```rust,no_run
//! use frontdesk_llm::{LlmDispatcher, LlmProfile, ProviderKind};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let profile = LlmProfile::new(ProviderKind::Anthropic, "claude-3-5-haiku-latest")
//!     .api_key("api-key")
//!     .system_prompt("You are a helpful assistant for a small business.");
//!
//! let dispatcher = LlmDispatcher::from_profile(profile)?;
//! let generation = dispatcher.generate("When are you open?", "").await;
//! if generation.success {
//!     println!("{}", generation.response.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

mod anthropic;
mod dispatch;
mod error;
mod google;
mod ollama;
mod openai;
mod profile;
mod types;

pub use anthropic::AnthropicAdapter;
pub use dispatch::LlmDispatcher;
pub use error::{LlmError, LlmResult};
pub use google::GoogleAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use profile::{LlmProfile, ProviderKind};
pub use types::{ChatMessage, ChatRole, Generation, Usage, build_messages};
