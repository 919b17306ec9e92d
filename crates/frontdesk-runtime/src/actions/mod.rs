//! The action registry.
//!
//! Every capability the runtime exposes is an [`Action`] keyed by a
//! stable name. Actions receive the turn input and a context holding the
//! shared components; they return messages plus an event list and never
//! mutate state directly.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use frontdesk_audit::AuditLog;
use frontdesk_backend::BackendClient;
use frontdesk_config::{ConfigCache, LlmConfig, LlmProviderKind};
use frontdesk_llm::{LlmDispatcher, LlmProfile, ProviderKind};
use frontdesk_retrieval::{Guardrails, KnowledgeBase};

use crate::clock::Clock;
use crate::error::RuntimeResult;
use crate::events::Event;
use crate::turn::{BotMessage, TurnInput};

mod booking;
mod meeting;
mod qa;
mod utility;

pub use booking::{
    BookingFormAction, CancelBookingAction, CheckBookingStatusAction, GetAvailabilityAction,
    LookupFormAction, RescheduleBookingAction,
};
pub use meeting::{GetAvailableMeetingTimesAction, MeetingFormAction};
pub use qa::{AnswerQuestionAction, LlmFallbackAction};
pub use utility::{HandoffAction, ResetAction};

/// The single apology used for unexpected failures.
pub const APOLOGY: &str =
    "I'm sorry, something went wrong on our end. Please try again in a moment.";

/// Shared components handed to every action.
pub struct ActionContext {
    /// Layered configuration cache.
    pub config: Arc<ConfigCache>,
    /// Booking backend client.
    pub backend: Arc<BackendClient>,
    /// Retrieval entry point.
    pub knowledge: Arc<KnowledgeBase>,
    /// Guardrail evaluator.
    pub guardrails: Guardrails,
    /// Audit log.
    pub audit: AuditLog,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Dispatcher memo, keyed by the config snapshot that produced it.
    /// Rebuilt only when the cache hands out a fresh snapshot.
    llm_handle: tokio::sync::Mutex<Option<(Arc<LlmConfig>, Arc<LlmDispatcher>)>>,
}

impl ActionContext {
    /// Create a context over the shared components.
    pub fn new(
        config: Arc<ConfigCache>,
        backend: Arc<BackendClient>,
        knowledge: Arc<KnowledgeBase>,
        guardrails: Guardrails,
        audit: AuditLog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            backend,
            knowledge,
            guardrails,
            audit,
            clock,
            llm_handle: tokio::sync::Mutex::new(None),
        }
    }

    /// Get the LLM dispatcher for the current config snapshot. The
    /// handle is initialized lazily and reused until the snapshot
    /// changes. Returns `None` (with a warning) when the configuration
    /// is unusable, so a broken LLM setup degrades instead of failing
    /// the turn.
    pub async fn llm(&self) -> Option<Arc<LlmDispatcher>> {
        let config = self.config.get_llm_config().await;

        let mut handle = self.llm_handle.lock().await;
        if let Some((cached_config, dispatcher)) = handle.as_ref() {
            if Arc::ptr_eq(cached_config, &config) {
                return Some(dispatcher.clone());
            }
        }

        let provider = match config.provider {
            LlmProviderKind::OpenAi => ProviderKind::OpenAi,
            LlmProviderKind::Azure => ProviderKind::Azure,
            LlmProviderKind::Anthropic => ProviderKind::Anthropic,
            LlmProviderKind::Google => ProviderKind::Google,
            LlmProviderKind::Ollama => ProviderKind::Ollama,
            LlmProviderKind::Custom => ProviderKind::Custom,
        };

        let mut profile = LlmProfile::new(provider, config.model.clone())
            .temperature(config.temperature)
            .max_tokens(config.max_tokens)
            .system_prompt(config.system_prompt.clone());
        if let Some(key) = &config.api_key {
            profile = profile.api_key(key.clone());
        }
        if let Some(url) = &config.base_url {
            profile = profile.base_url(url.clone());
        }

        match LlmDispatcher::from_profile(profile) {
            Ok(dispatcher) => {
                let dispatcher = Arc::new(dispatcher);
                *handle = Some((config, dispatcher.clone()));
                Some(dispatcher)
            },
            Err(e) => {
                *handle = None;
                warn!(error = %e, "llm dispatcher unavailable");
                None
            },
        }
    }
}

impl std::fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext").finish_non_exhaustive()
    }
}

/// What an action produced for this turn.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    /// Messages to send, in order.
    pub messages: Vec<BotMessage>,
    /// Events to apply, in order.
    pub events: Vec<Event>,
}

impl ActionOutcome {
    /// An outcome with one text message and no events.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            messages: vec![BotMessage::text(text)],
            events: Vec::new(),
        }
    }

    /// Append a message.
    #[must_use]
    pub fn with_message(mut self, text: impl Into<String>) -> Self {
        self.messages.push(BotMessage::text(text));
        self
    }

    /// Append an event.
    #[must_use]
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }
}

/// A named runtime capability.
#[async_trait]
pub trait Action: Send + Sync {
    /// Stable action name used in the registry and audit records.
    fn name(&self) -> &'static str;

    /// Run the action for one turn.
    ///
    /// # Errors
    ///
    /// An error here is the *internal* taxonomy kind: the runtime
    /// converts it into an exception audit record and a single apology.
    /// Expected failures (validation, not-found, upstream errors) are
    /// handled inside the action and come back as a normal outcome.
    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome>;
}

/// Registry of all known actions.
pub struct ActionRegistry {
    actions: HashMap<&'static str, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Registry with every built-in action.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BookingFormAction));
        registry.register(Arc::new(LookupFormAction));
        registry.register(Arc::new(CancelBookingAction));
        registry.register(Arc::new(RescheduleBookingAction));
        registry.register(Arc::new(CheckBookingStatusAction));
        registry.register(Arc::new(GetAvailabilityAction));
        registry.register(Arc::new(MeetingFormAction));
        registry.register(Arc::new(GetAvailableMeetingTimesAction));
        registry.register(Arc::new(AnswerQuestionAction));
        registry.register(Arc::new(LlmFallbackAction));
        registry.register(Arc::new(HandoffAction));
        registry.register(Arc::new(ResetAction));
        registry
    }

    /// Add (or replace) an action.
    pub fn register(&mut self, action: Arc<dyn Action>) {
        self.actions.insert(action.name(), action);
    }

    /// Look up an action by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    /// Registered action names.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.keys().copied().collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.len())
            .finish()
    }
}
