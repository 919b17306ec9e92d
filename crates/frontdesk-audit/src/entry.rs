//! Audit record types.

use chrono::{DateTime, Utc};
use frontdesk_core::ConversationId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sanitize::sanitize_metadata;

/// Maximum length of a stored error string. Longer messages are truncated
/// so a misbehaving upstream cannot bloat the durable log.
const MAX_ERROR_LEN: usize = 500;

/// Outcome status of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Action completed successfully.
    Success,
    /// Action failed with a known error.
    Failed,
    /// Action raised an unexpected error.
    Exception,
    /// Action started a multi-step flow.
    Initiated,
    /// Informational record only.
    Logged,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Exception => write!(f, "exception"),
            Self::Initiated => write!(f, "initiated"),
            Self::Logged => write!(f, "logged"),
        }
    }
}

/// A single audit record.
///
/// Metadata attached via [`AuditEvent::with_metadata`] is sanitized on the
/// way in: secret-like keys are dropped and PII keys are replaced with
/// their hash. The record itself never holds raw PII.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the record was created (UTC).
    pub timestamp: DateTime<Utc>,
    /// Stable action name (e.g. `create_booking`).
    pub action: String,
    /// The conversation this action belongs to.
    pub conversation_id: ConversationId,
    /// Booking reference, when the action touched a booking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    /// Meeting reference, when the action touched a meeting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    /// Outcome status.
    pub status: AuditStatus,
    /// 16-hex-char SHA-256 prefix over the action's primary PII value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_hash: Option<String>,
    /// Sanitized metadata map.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Error message for failed/exception outcomes, truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit record.
    pub fn new(
        action: impl Into<String>,
        conversation_id: ConversationId,
        status: AuditStatus,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            conversation_id,
            booking_id: None,
            meeting_id: None,
            status,
            data_hash: None,
            metadata: Map::new(),
            error: None,
        }
    }

    /// Attach a booking reference.
    #[must_use]
    pub fn with_booking_id(mut self, id: impl Into<String>) -> Self {
        self.booking_id = Some(id.into());
        self
    }

    /// Attach a meeting reference.
    #[must_use]
    pub fn with_meeting_id(mut self, id: impl Into<String>) -> Self {
        self.meeting_id = Some(id.into());
        self
    }

    /// Attach the hash of the action's primary PII value.
    #[must_use]
    pub fn with_data_hash(mut self, hash: impl Into<String>) -> Self {
        self.data_hash = Some(hash.into());
        self
    }

    /// Attach metadata. The map is sanitized before it is stored.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = sanitize_metadata(metadata);
        self
    }

    /// Attach an error message, truncated to a bounded length.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.len() > MAX_ERROR_LEN {
            let mut cut = MAX_ERROR_LEN;
            while !error.is_char_boundary(cut) {
                cut = cut.saturating_sub(1);
            }
            error.truncate(cut);
        }
        self.error = Some(error);
        self
    }
}

/// A high-volume interaction record.
///
/// Captures classification shape only - intent name, rounded confidence,
/// entity count, and how many important slots are filled. Never any
/// message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// When the turn was processed (UTC).
    pub timestamp: DateTime<Utc>,
    /// NLU intent name.
    pub intent: String,
    /// NLU confidence, rounded to three decimals.
    pub confidence: f64,
    /// Number of extracted entities.
    pub entity_count: usize,
    /// Number of filled important slots.
    pub filled_slots: usize,
}

impl InteractionRecord {
    /// Create a new interaction record. Confidence is rounded to three
    /// decimals before storage.
    pub fn new(
        intent: impl Into<String>,
        confidence: f64,
        entity_count: usize,
        filled_slots: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            intent: intent.into(),
            confidence: (confidence * 1000.0).round() / 1000.0,
            entity_count,
            filled_slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&AuditStatus::Exception).unwrap();
        assert_eq!(json, "\"exception\"");
    }

    #[test]
    fn test_error_truncation() {
        let long = "x".repeat(2000);
        let event = AuditEvent::new(
            "create_booking",
            ConversationId::from("c1"),
            AuditStatus::Exception,
        )
        .with_error(long);
        assert_eq!(event.error.unwrap().len(), 500);
    }

    #[test]
    fn test_confidence_rounding() {
        let record = InteractionRecord::new("greet", 0.421_739, 2, 0);
        assert!((record.confidence - 0.422).abs() < f64::EPSILON);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let event = AuditEvent::new(
            "handoff",
            ConversationId::from("c1"),
            AuditStatus::Logged,
        );
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("booking_id").is_none());
        assert!(json.get("error").is_none());
    }
}
