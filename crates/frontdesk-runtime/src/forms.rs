//! Form definitions and required-slot resolution.
//!
//! A form walks the user through its required slots one at a time, then
//! hands off to its terminal action. The required list is resolved per
//! turn - the form's minimum slots united with the admin-selected
//! `required_fields`, mapped onto slot names - so a config edit takes
//! effect on the next prompt.

use frontdesk_config::{BookingTaskConfig, MeetingTaskConfig};

use crate::events::SlotMap;
use crate::turn::TurnInput;

/// The booking form name.
pub const BOOKING_FORM: &str = "booking_form";
/// The meeting form name.
pub const MEETING_FORM: &str = "meeting_form";
/// The booking-lookup form name (collects a reference only).
pub const LOOKUP_FORM: &str = "booking_lookup_form";
/// Bookkeeping slot holding the slot currently being requested.
pub const REQUESTED_SLOT: &str = "requested_slot";

/// Where a form is in its fill loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// No form active.
    Inactive,
    /// Waiting for the user to supply a slot.
    RequestingSlot(String),
    /// A candidate for the slot is being validated this turn.
    ValidatingSlot(String),
    /// Every required slot is filled; the terminal action runs next.
    Completed,
}

/// Compute the form state for the current turn.
#[must_use]
pub fn form_state(input: &TurnInput, required: &[&'static str], candidate: Option<&str>) -> FormState {
    if input.active_form.is_none() {
        return FormState::Inactive;
    }
    match next_unfilled(&input.slots, required) {
        None => FormState::Completed,
        Some(slot) => {
            if candidate.is_some() {
                FormState::ValidatingSlot(slot.to_string())
            } else {
                FormState::RequestingSlot(slot.to_string())
            }
        },
    }
}

/// First required slot with no value.
#[must_use]
pub fn next_unfilled<'a>(slots: &SlotMap, required: &[&'a str]) -> Option<&'a str> {
    required.iter().find(|s| !slots.contains_key(**s)).copied()
}

// ---------------------------------------------------------------------------
// Required-slot resolution
// ---------------------------------------------------------------------------

fn map_booking_field(field: &str) -> Option<&'static str> {
    match field {
        "service" => Some("service_type"),
        "date" => Some("booking_date"),
        "time" => Some("booking_time"),
        "name" => Some("customer_name"),
        "email" => Some("customer_email"),
        "phone" => Some("customer_phone"),
        "party_size" => Some("party_size"),
        "notes" => Some("notes"),
        _ => None,
    }
}

fn map_meeting_field(field: &str) -> Option<&'static str> {
    match field {
        "type" => Some("meeting_type"),
        "date" => Some("meeting_date"),
        "time" => Some("meeting_time"),
        "duration" => Some("meeting_duration"),
        "name" => Some("attendee_name"),
        "email" => Some("attendee_email"),
        _ => None,
    }
}

/// Required slots for the booking form: the form's minimum united with
/// the mapped `required_fields`. `party_size` and `notes` stay optional
/// unless the admin lists them.
#[must_use]
pub fn booking_required_slots(config: &BookingTaskConfig) -> Vec<&'static str> {
    let mut slots = vec![
        "service_type",
        "booking_date",
        "booking_time",
        "customer_name",
        "customer_email",
    ];
    for field in &config.required_fields {
        if let Some(slot) = map_booking_field(field) {
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }
    }
    slots
}

/// Required slots for the meeting form.
#[must_use]
pub fn meeting_required_slots(config: &MeetingTaskConfig) -> Vec<&'static str> {
    let mut slots = vec![
        "meeting_type",
        "meeting_date",
        "meeting_time",
        "meeting_duration",
        "attendee_name",
        "attendee_email",
    ];
    for field in &config.required_fields {
        if let Some(slot) = map_meeting_field(field) {
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }
    }
    slots
}

// ---------------------------------------------------------------------------
// Candidate extraction
// ---------------------------------------------------------------------------

/// Entity names the NLU front-end uses for each slot.
const ENTITY_ALIASES: [(&str, &[&str]); 15] = [
    ("booking_id", &["booking_id", "booking_reference", "reference"]),
    ("service_type", &["service_type", "service"]),
    ("booking_date", &["booking_date", "date"]),
    ("booking_time", &["booking_time", "time"]),
    ("customer_name", &["customer_name", "name", "person"]),
    ("customer_email", &["customer_email", "email"]),
    ("customer_phone", &["customer_phone", "phone", "phone_number"]),
    ("party_size", &["party_size", "number"]),
    ("notes", &["notes"]),
    ("meeting_type", &["meeting_type", "service_type", "service"]),
    ("meeting_date", &["meeting_date", "date"]),
    ("meeting_time", &["meeting_time", "time"]),
    ("meeting_duration", &["meeting_duration", "duration"]),
    ("attendee_name", &["attendee_name", "name", "person"]),
    ("attendee_email", &["attendee_email", "email"]),
];

/// Candidate value for a slot on this turn: a matching entity first,
/// falling back to the raw utterance when this slot is the one being
/// requested.
#[must_use]
pub fn candidate_for(input: &TurnInput, slot: &str, is_requested: bool) -> Option<String> {
    let aliases = ENTITY_ALIASES
        .iter()
        .find(|(name, _)| *name == slot)
        .map(|(_, aliases)| *aliases)
        .unwrap_or_default();

    for alias in aliases {
        if let Some(value) = input.entity_text(alias) {
            return Some(value);
        }
    }

    if is_requested && !input.text.trim().is_empty() {
        return Some(input.text.trim().to_string());
    }
    None
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// The question asked for a slot.
#[must_use]
pub fn prompt_for_slot(slot: &str, service_names: &[String], meeting_types: &[String]) -> String {
    match slot {
        "service_type" => format!(
            "What service would you like? We offer: {}.",
            service_names.join(", ")
        ),
        "booking_date" => "What date works for you?".to_string(),
        "booking_time" => "What time would you like?".to_string(),
        "customer_name" => "Can I get your full name?".to_string(),
        "customer_email" => "What email address should we send the confirmation to?".to_string(),
        "customer_phone" => "What's the best phone number to reach you on?".to_string(),
        "party_size" => "How many people should we expect?".to_string(),
        "notes" => "Anything we should know ahead of time?".to_string(),
        "meeting_type" => format!(
            "What type of meeting would you like? Options: {}.",
            meeting_types.join(", ")
        ),
        "meeting_date" => "What date works for the meeting?".to_string(),
        "meeting_time" => "What time works for the meeting?".to_string(),
        "meeting_duration" => {
            "How long should the meeting be? 15 minutes, 30 minutes, or 1 hour?".to_string()
        },
        "attendee_name" => "Can I get your full name?".to_string(),
        "attendee_email" => "What email should the meeting invite go to?".to_string(),
        _ => "Could you tell me a bit more?".to_string(),
    }
}
