//! Slot values, turn events, and conversation state.
//!
//! Events are the only way an action changes conversation state. The
//! runtime applies the event list atomically at turn end, in list order;
//! applying the same list to the same initial state is deterministic and
//! repeatable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Slots the reset action clears. Everything the runtime ever sets lives
/// in this list.
pub const KNOWN_SLOTS: [&str; 18] = [
    "service_type",
    "booking_date",
    "booking_time",
    "customer_name",
    "customer_email",
    "customer_phone",
    "party_size",
    "notes",
    "booking_id",
    "current_booking",
    "meeting_type",
    "meeting_date",
    "meeting_time",
    "meeting_duration",
    "attendee_name",
    "attendee_email",
    "meeting_id",
    "requested_slot",
];

/// A typed slot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    /// Plain text (most validator outputs).
    Text(String),
    /// Integer (party sizes, counts).
    Integer(i64),
    /// Boolean flag.
    Flag(bool),
    /// Structured data (retrieved booking records).
    Data(Value),
}

impl SlotValue {
    /// Text content, when this is a text slot.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value for prompts and API payloads.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Flag(b) => b.to_string(),
            Self::Data(v) => v.to_string(),
        }
    }
}

impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SlotValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// Ordered slot map carried per conversation.
pub type SlotMap = BTreeMap<String, SlotValue>;

/// Events an action may emit. Applied in list order at turn end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Set a slot (or clear it with `value: None`).
    SetSlot {
        /// Slot name.
        name: String,
        /// New value; `None` clears.
        value: Option<SlotValue>,
    },
    /// Clear every known slot.
    ResetAllSlots,
    /// Run another action after this one.
    FollowupAction {
        /// Action name.
        name: String,
    },
    /// Activate a form.
    ActivateForm {
        /// Form name.
        name: String,
    },
    /// Deactivate the current form.
    DeactivateForm,
}

impl Event {
    /// Convenience constructor for setting a slot.
    pub fn set_slot(name: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        Self::SetSlot {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Convenience constructor for clearing a slot.
    pub fn clear_slot(name: impl Into<String>) -> Self {
        Self::SetSlot {
            name: name.into(),
            value: None,
        }
    }
}

/// Conversation state as the runtime sees it for one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    /// Slot map.
    pub slots: SlotMap,
    /// Active form, if any. A conversation has at most one.
    pub active_form: Option<String>,
}

impl ConversationState {
    /// Apply an event list in order. Followup events do not change state;
    /// the runtime consumes them when scheduling the next action.
    pub fn apply(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::SetSlot { name, value } => match value {
                    Some(v) => {
                        self.slots.insert(name.clone(), v.clone());
                    },
                    None => {
                        self.slots.remove(name);
                    },
                },
                Event::ResetAllSlots => {
                    for slot in KNOWN_SLOTS {
                        self.slots.remove(slot);
                    }
                },
                Event::FollowupAction { .. } => {},
                Event::ActivateForm { name } => {
                    self.active_form = Some(name.clone());
                },
                Event::DeactivateForm => {
                    self.active_form = None;
                },
            }
        }
    }
}
