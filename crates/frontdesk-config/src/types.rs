//! Configuration types for the dialogue runtime.
//!
//! One typed snapshot struct per task kind, plus the bot identity and the
//! LLM provider configuration. Every struct implements [`Default`] with
//! working production values so a missing or unreachable admin store still
//! yields a usable configuration. Loaders validate the JSON envelope once;
//! consumers never touch raw JSON.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Serde adapter for `HH:MM` clock strings.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(t: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&t.format("%H:%M").to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(de)?;
        NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// BusinessHours
// ---------------------------------------------------------------------------

/// Daily opening interval, local clock, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    /// Opening time (`HH:MM`).
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// Closing time (`HH:MM`), exclusive.
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl BusinessHours {
    /// Build from `HH:MM` strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if either string fails to parse or
    /// `start >= end`.
    pub fn parse(start: &str, end: &str) -> ConfigResult<Self> {
        let start = NaiveTime::parse_from_str(start, "%H:%M")
            .map_err(|e| ConfigError::Invalid(format!("bad business_hours.start: {e}")))?;
        let end = NaiveTime::parse_from_str(end, "%H:%M")
            .map_err(|e| ConfigError::Invalid(format!("bad business_hours.end: {e}")))?;
        let hours = Self { start, end };
        hours.validate()?;
        Ok(hours)
    }

    /// Check the `start < end` invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the interval is empty or inverted.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.start < self.end {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "business_hours.start ({}) must be before business_hours.end ({})",
                self.start.format("%H:%M"),
                self.end.format("%H:%M"),
            )))
        }
    }

    /// Whether a time-of-day falls inside the interval (`start <= t < end`).
    #[must_use]
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for BusinessHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

// ---------------------------------------------------------------------------
// ServiceEntry
// ---------------------------------------------------------------------------

/// A bookable service in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEntry {
    /// Stable service id (`consultation`).
    pub id: String,
    /// Display name (`Consultation`).
    pub name: String,
    /// Appointment length in minutes.
    pub duration_minutes: u32,
    /// Whether the service is currently offered.
    pub enabled: bool,
}

impl ServiceEntry {
    /// Create an enabled service.
    pub fn new(id: impl Into<String>, name: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration_minutes,
            enabled: true,
        }
    }
}

impl Default for ServiceEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            duration_minutes: 30,
            enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Task configs
// ---------------------------------------------------------------------------

/// Configuration snapshot for the booking task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingTaskConfig {
    /// Whether the task is offered at all.
    pub enabled: bool,
    /// Admin-selected required fields (mapped onto slot names per turn).
    pub required_fields: Vec<String>,
    /// Admin-selected optional fields.
    pub optional_fields: Vec<String>,
    /// Daily booking window.
    pub business_hours: BusinessHours,
    /// Dates with no availability (holidays, closures).
    pub blocked_dates: Vec<NaiveDate>,
    /// Service catalog.
    pub services: Vec<ServiceEntry>,
    /// How far ahead bookings may be placed, in days.
    pub booking_window_days: i64,
}

impl BookingTaskConfig {
    /// The currently offered services.
    #[must_use]
    pub fn enabled_services(&self) -> Vec<&ServiceEntry> {
        self.services.iter().filter(|s| s.enabled).collect()
    }
}

impl Default for BookingTaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required_fields: vec![
                "date".to_string(),
                "time".to_string(),
                "name".to_string(),
                "email".to_string(),
            ],
            optional_fields: vec![
                "phone".to_string(),
                "party_size".to_string(),
                "notes".to_string(),
            ],
            business_hours: BusinessHours::default(),
            blocked_dates: Vec::new(),
            services: vec![
                ServiceEntry::new("consultation", "Consultation", 60),
                ServiceEntry::new("demo", "Demo", 30),
                ServiceEntry::new("support", "Support", 30),
            ],
            booking_window_days: 90,
        }
    }
}

/// Configuration snapshot for the meeting task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingTaskConfig {
    /// Whether the task is offered at all.
    pub enabled: bool,
    /// Admin-selected required fields.
    pub required_fields: Vec<String>,
    /// Admin-selected optional fields.
    pub optional_fields: Vec<String>,
    /// Offered meeting types.
    pub meeting_types: Vec<String>,
    /// Offered durations, canonical form.
    pub durations: Vec<String>,
    /// Daily scheduling window.
    pub business_hours: BusinessHours,
    /// Dates with no availability.
    pub blocked_dates: Vec<NaiveDate>,
    /// How far ahead meetings may be scheduled, in days.
    pub booking_window_days: i64,
}

impl Default for MeetingTaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required_fields: vec![
                "date".to_string(),
                "time".to_string(),
                "name".to_string(),
                "email".to_string(),
            ],
            optional_fields: vec!["phone".to_string(), "notes".to_string()],
            meeting_types: vec![
                "consultation".to_string(),
                "demo".to_string(),
                "support".to_string(),
                "follow-up".to_string(),
            ],
            durations: vec![
                "15 minutes".to_string(),
                "30 minutes".to_string(),
                "1 hour".to_string(),
            ],
            business_hours: BusinessHours {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
                end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            },
            blocked_dates: Vec::new(),
            booking_window_days: 30,
        }
    }
}

/// Configuration snapshot for the cancellation/reschedule task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CancelTaskConfig {
    /// Whether the task is offered at all.
    pub enabled: bool,
    /// Maximum number of reschedules per booking.
    pub max_reschedules: u32,
    /// Hours before the appointment after which cancellation is refused.
    pub cancellation_window_hours: u32,
    /// Policy text appended to cancellation confirmations.
    pub policy_text: String,
}

impl Default for CancelTaskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_reschedules: 3,
            cancellation_window_hours: 24,
            policy_text: String::new(),
        }
    }
}

/// The task kinds the runtime knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Service bookings.
    Booking,
    /// Meetings.
    Meeting,
    /// Cancellation and rescheduling.
    Cancel,
}

impl TaskKind {
    /// Stable name used in cache keys and admin routes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Meeting => "meeting",
            Self::Cancel => "cancel",
        }
    }

    /// Built-in default configuration for this kind.
    #[must_use]
    pub fn default_config(self) -> TaskConfig {
        match self {
            Self::Booking => TaskConfig::Booking(BookingTaskConfig::default()),
            Self::Meeting => TaskConfig::Meeting(MeetingTaskConfig::default()),
            Self::Cancel => TaskConfig::Cancel(CancelTaskConfig::default()),
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A task configuration snapshot, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskConfig {
    /// Booking task.
    Booking(BookingTaskConfig),
    /// Meeting task.
    Meeting(MeetingTaskConfig),
    /// Cancellation task.
    Cancel(CancelTaskConfig),
}

impl TaskConfig {
    /// Whether the task is enabled. Missing config defaults to enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        match self {
            Self::Booking(c) => c.enabled,
            Self::Meeting(c) => c.enabled,
            Self::Cancel(c) => c.enabled,
        }
    }

    /// The task's business hours, when it has any.
    #[must_use]
    pub fn business_hours(&self) -> Option<&BusinessHours> {
        match self {
            Self::Booking(c) => Some(&c.business_hours),
            Self::Meeting(c) => Some(&c.business_hours),
            Self::Cancel(_) => None,
        }
    }

    /// Parse an untagged admin JSON document for a known kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document does not match the
    /// kind's schema.
    pub fn from_admin_json(kind: TaskKind, value: &serde_json::Value) -> ConfigResult<Self> {
        let parse_err = |e: serde_json::Error| ConfigError::Parse {
            key: format!("task/{kind}"),
            message: e.to_string(),
        };
        match kind {
            TaskKind::Booking => Ok(Self::Booking(
                serde_json::from_value(value.clone()).map_err(parse_err)?,
            )),
            TaskKind::Meeting => Ok(Self::Meeting(
                serde_json::from_value(value.clone()).map_err(parse_err)?,
            )),
            TaskKind::Cancel => Ok(Self::Cancel(
                serde_json::from_value(value.clone()).map_err(parse_err)?,
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// BotConfig
// ---------------------------------------------------------------------------

/// Bot identity and canned responses, loaded at startup and refreshed on
/// invalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Assistant display name.
    pub bot_name: String,
    /// Business identity.
    pub business_name: String,
    /// Greeting for new conversations.
    pub welcome_message: String,
    /// Response when nothing matched.
    pub fallback_message: String,
    /// Response offered alongside a human handoff.
    pub handoff_message: String,
    /// IANA timezone name for the business's local clock.
    pub timezone: String,
    /// Default opening interval when a task config has none.
    pub default_hours: BusinessHours,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: "Frontdesk".to_string(),
            business_name: "Our business".to_string(),
            welcome_message: "Hi! I can help with bookings, meetings, and questions.".to_string(),
            fallback_message: "I'm sorry, I didn't quite get that. Could you rephrase?"
                .to_string(),
            handoff_message: "Let me connect you with a member of our team.".to_string(),
            timezone: "UTC".to_string(),
            default_hours: BusinessHours::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// OpenAI chat completions.
    OpenAi,
    /// Azure-hosted OpenAI variant.
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

impl std::fmt::Display for LlmProviderKind {
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

/// LLM provider configuration.
///
/// The raw API key is kept for in-process use by the dispatcher only; it
/// is skipped on serialization and hidden from `Debug`. Dashboard-facing
/// reads go through [`LlmConfig::masked`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider selection.
    pub provider: LlmProviderKind,
    /// Model id (or Azure deployment name).
    pub model: String,
    /// Raw API key. Never serialized.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Override endpoint (Azure resource URL, Ollama host, custom base).
    pub base_url: Option<String>,
    /// Sampling temperature, `[0, 2]`.
    pub temperature: f64,
    /// Maximum tokens per completion, at least 50.
    pub max_tokens: u32,
    /// System prompt prepended to every request.
    pub system_prompt: String,
    /// Whether retrieval context should be offered to the model.
    pub use_knowledge_base: bool,
    /// Whether low-confidence turns fall back to the LLM.
    pub fallback_to_llm: bool,
    /// NLU confidence below which the fallback triggers, `[0, 1]`.
    pub confidence_threshold: f64,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("use_knowledge_base", &self.use_knowledge_base)
            .field("fallback_to_llm", &self.fallback_to_llm)
            .field("confidence_threshold", &self.confidence_threshold)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_tokens: 500,
            system_prompt: "You are a helpful assistant for a small business.".to_string(),
            use_knowledge_base: true,
            fallback_to_llm: true,
            confidence_threshold: 0.6,
        }
    }
}

impl LlmConfig {
    /// Validate the numeric envelope once at load time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when temperature, max tokens, or
    /// the confidence threshold fall outside their ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if self.max_tokens < 50 {
            return Err(ConfigError::Invalid(format!(
                "max_tokens {} below minimum 50",
                self.max_tokens
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }

    /// Dashboard-facing view with the key masked.
    #[must_use]
    pub fn masked(&self) -> LlmConfigView {
        LlmConfigView {
            provider: self.provider,
            model: self.model.clone(),
            api_key_masked: self.api_key.as_deref().map(mask_api_key),
            api_key_set: self.api_key.is_some(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt.clone(),
            use_knowledge_base: self.use_knowledge_base,
            fallback_to_llm: self.fallback_to_llm,
            confidence_threshold: self.confidence_threshold,
        }
    }
}

/// Masked view of [`LlmConfig`] for dashboard reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfigView {
    /// Provider selection.
    pub provider: LlmProviderKind,
    /// Model id.
    pub model: String,
    /// `first4 + "*"… + last4`, or `None` when no key is set.
    pub api_key_masked: Option<String>,
    /// Whether a key is configured at all.
    pub api_key_set: bool,
    /// Override endpoint.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// System prompt.
    pub system_prompt: String,
    /// Whether retrieval context is offered to the model.
    pub use_knowledge_base: bool,
    /// Whether low-confidence turns fall back to the LLM.
    pub fallback_to_llm: bool,
    /// Fallback confidence threshold.
    pub confidence_threshold: f64,
}

/// Mask an API key for display: first and last four characters kept when
/// the key is long enough, every character starred otherwise.
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let first: String = chars[..4].iter().collect();
        let last: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        let stars = "*".repeat(chars.len().saturating_sub(8));
        format!("{first}{stars}{last}")
    } else {
        "*".repeat(chars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_hours_contains_half_open() {
        let hours = BusinessHours::parse("09:00", "18:00").unwrap();
        assert!(hours.contains(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert!(hours.contains(NaiveTime::from_hms_opt(17, 59, 0).unwrap()));
        assert!(!hours.contains(NaiveTime::from_hms_opt(18, 0, 0).unwrap()));
        assert!(!hours.contains(NaiveTime::from_hms_opt(8, 30, 0).unwrap()));
    }

    #[test]
    fn test_business_hours_invariant() {
        assert!(BusinessHours::parse("18:00", "09:00").is_err());
        assert!(BusinessHours::parse("09:00", "09:00").is_err());
        assert!(BusinessHours::parse("9am", "18:00").is_err());
    }

    #[test]
    fn test_business_hours_hhmm_serde() {
        let hours = BusinessHours::default();
        let json = serde_json::to_value(hours).unwrap();
        assert_eq!(json["start"], "09:00");
        assert_eq!(json["end"], "18:00");

        let back: BusinessHours = serde_json::from_value(json).unwrap();
        assert_eq!(back, hours);
    }

    #[test]
    fn test_task_config_from_admin_json() {
        let doc = serde_json::json!({
            "enabled": false,
            "booking_window_days": 30,
            "blocked_dates": ["2025-12-25"],
        });
        let config = TaskConfig::from_admin_json(TaskKind::Booking, &doc).unwrap();
        let TaskConfig::Booking(booking) = config else {
            panic!("expected booking config");
        };
        assert!(!booking.enabled);
        assert_eq!(booking.booking_window_days, 30);
        assert_eq!(booking.blocked_dates.len(), 1);
        // Unspecified fields fall back to defaults.
        assert_eq!(booking.services.len(), 3);
    }

    #[test]
    fn test_llm_config_validation() {
        let mut config = LlmConfig::default();
        assert!(config.validate().is_ok());

        config.temperature = 2.5;
        assert!(config.validate().is_err());

        config.temperature = 1.0;
        config.max_tokens = 10;
        assert!(config.validate().is_err());

        config.max_tokens = 100;
        config.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = LlmConfig {
            api_key: Some("sk-super-secret-value".to_string()),
            ..LlmConfig::default()
        };
        let dump = serde_json::to_string(&config).unwrap();
        assert!(!dump.contains("sk-super-secret-value"));

        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-super-secret-value"));
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("sk-abcdefghij-wxyz"), "sk-a**********wxyz");
        assert_eq!(mask_api_key("short"), "*****");
        assert_eq!(mask_api_key("12345678"), "********");
        assert_eq!(mask_api_key(""), "");
    }

    #[test]
    fn test_masked_view() {
        let config = LlmConfig {
            api_key: Some("sk-abcdefghij-wxyz".to_string()),
            ..LlmConfig::default()
        };
        let view = config.masked();
        assert!(view.api_key_set);
        assert_eq!(view.api_key_masked.as_deref(), Some("sk-a**********wxyz"));

        let none = LlmConfig::default().masked();
        assert!(!none.api_key_set);
        assert!(none.api_key_masked.is_none());
    }
}
