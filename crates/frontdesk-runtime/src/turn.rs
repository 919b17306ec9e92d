//! Per-turn input and output contracts with the NLU front-end.

use frontdesk_core::ConversationId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::{Event, SlotMap};

/// NLU classification of the latest utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Intent label.
    pub name: String,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Intent {
    /// Create an intent.
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// An entity extracted by the NLU front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name (`email`, `date`, ...).
    pub entity: String,
    /// Extracted value.
    pub value: Value,
}

impl Entity {
    /// Create a text entity.
    pub fn text(entity: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            value: Value::String(value.into()),
        }
    }
}

/// One user turn as delivered by the NLU front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInput {
    /// Conversation id.
    pub sender_id: ConversationId,
    /// Raw utterance text.
    pub text: String,
    /// Intent classification.
    pub intent: Intent,
    /// Extracted entities.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Current slot map.
    #[serde(default)]
    pub slots: SlotMap,
    /// Active form, if any.
    #[serde(default)]
    pub active_form: Option<String>,
    /// Input channel name.
    #[serde(default)]
    pub channel: String,
}

impl TurnInput {
    /// Text value of a slot, if set and textual.
    #[must_use]
    pub fn slot_text(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|v| v.as_str())
    }

    /// First entity with the given name, as text.
    #[must_use]
    pub fn entity_text(&self, name: &str) -> Option<String> {
        self.entities.iter().find(|e| e.entity == name).map(|e| {
            match &e.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        })
    }
}

/// A message back to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BotMessage {
    /// Plain text.
    Text(String),
    /// Structured side-channel payload (handoff events and the like),
    /// delivered when the transport supports custom data.
    Custom(Value),
}

impl BotMessage {
    /// Create a text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The text content, when this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Custom(_) => None,
        }
    }
}

/// The runtime's reply for one turn: ordered messages plus the event list
/// the front-end applies to conversation state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnOutput {
    /// Messages, in sending order.
    pub messages: Vec<BotMessage>,
    /// Events, in application order.
    pub events: Vec<Event>,
}

impl TurnOutput {
    /// A reply with one text message and no events.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            messages: vec![BotMessage::text(text)],
            events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_lookup() {
        let input = TurnInput {
            sender_id: ConversationId::from("c1"),
            text: "book tomorrow".to_string(),
            intent: Intent::new("book_service", 0.93),
            entities: vec![
                Entity::text("date", "tomorrow"),
                Entity {
                    entity: "party_size".to_string(),
                    value: serde_json::json!(4),
                },
            ],
            slots: SlotMap::new(),
            active_form: None,
            channel: "rest".to_string(),
        };
        assert_eq!(input.entity_text("date").as_deref(), Some("tomorrow"));
        assert_eq!(input.entity_text("party_size").as_deref(), Some("4"));
        assert_eq!(input.entity_text("missing"), None);
    }

    #[test]
    fn test_turn_input_deserializes_with_defaults() {
        let input: TurnInput = serde_json::from_str(
            r#"{
                "sender_id": "c1",
                "text": "hi",
                "intent": {"name": "greet", "confidence": 0.99}
            }"#,
        )
        .unwrap();
        assert!(input.entities.is_empty());
        assert!(input.active_form.is_none());
    }
}
