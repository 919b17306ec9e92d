//! Request and response envelopes for the booking backend.
//!
//! Every response carries the `{success, error?, ...}` envelope; payload
//! fields are optional so partial backends deserialize cleanly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payload for `POST /bookings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    /// Canonical service name.
    pub service: String,
    /// Booking date.
    pub date: NaiveDate,
    /// Booking time, 24-hour `HH:MM`.
    pub time: String,
    /// Customer full name.
    pub customer_name: String,
    /// Customer email, normalized.
    pub customer_email: String,
    /// Customer phone, normalized, when collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Party size, when collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
    /// Free-form notes, when collected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Response for `POST /bookings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    /// Whether the booking was created.
    pub success: bool,
    /// Backend-assigned booking reference.
    #[serde(default)]
    pub booking_id: Option<String>,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// A booking record as the backend returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRecord {
    /// Booking reference.
    pub booking_id: Option<String>,
    /// Record status (`confirmed`, `cancelled`, ...).
    pub status: Option<String>,
    /// Booking date (ISO).
    pub date: Option<String>,
    /// Booking time (`HH:MM`).
    pub time: Option<String>,
    /// Service name.
    pub service: Option<String>,
    /// Customer name on the record.
    pub customer_name: Option<String>,
    /// Customer email on the record.
    pub customer_email: Option<String>,
}

/// Response for `GET /bookings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBookingResponse {
    /// Whether the lookup succeeded.
    pub success: bool,
    /// The record, on success.
    #[serde(default)]
    pub booking: Option<BookingRecord>,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response for `DELETE /bookings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingResponse {
    /// Whether the cancellation succeeded.
    pub success: bool,
    /// Confirmation message, when the backend sends one.
    #[serde(default)]
    pub message: Option<String>,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Payload for `PUT /bookings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    /// New booking date.
    pub date: NaiveDate,
    /// New booking time, 24-hour `HH:MM`.
    pub time: String,
}

/// Response for `PUT /bookings/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleBookingResponse {
    /// Whether the reschedule succeeded.
    pub success: bool,
    /// Booking reference.
    #[serde(default)]
    pub booking_id: Option<String>,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Response for the availability endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Whether the query succeeded.
    pub success: bool,
    /// Open times, 24-hour `HH:MM`, soonest first.
    #[serde(default)]
    pub available_times: Vec<String>,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// Payload for `POST /meetings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleMeetingRequest {
    /// Meeting type.
    pub meeting_type: String,
    /// Meeting date.
    pub date: NaiveDate,
    /// Meeting time, 24-hour `HH:MM`.
    pub time: String,
    /// Canonical duration (`30 minutes`).
    pub duration: String,
    /// Attendee full name.
    pub attendee_name: String,
    /// Attendee email, normalized.
    pub attendee_email: String,
}

/// Response for `POST /meetings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleMeetingResponse {
    /// Whether the meeting was scheduled.
    pub success: bool,
    /// Backend-assigned meeting id.
    #[serde(default)]
    pub meeting_id: Option<String>,
    /// Error message on failure.
    #[serde(default)]
    pub error: Option<String>,
}

impl ScheduleMeetingResponse {
    /// Whether the failure is a scheduling conflict (slot taken or
    /// otherwise unavailable), which callers resolve by offering
    /// alternative times.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|e| {
                let lower = e.to_lowercase();
                lower.contains("conflict") || lower.contains("unavailable")
            })
    }
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Backend-reported status string.
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_defaults() {
        let response: CreateBookingResponse =
            serde_json::from_str(r#"{"success": true, "booking_id": "BK-0001-0002"}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.booking_id.as_deref(), Some("BK-0001-0002"));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_conflict_detection() {
        let response: ScheduleMeetingResponse = serde_json::from_str(
            r#"{"success": false, "error": "Time slot unavailable"}"#,
        )
        .unwrap();
        assert!(response.is_conflict());

        let response: ScheduleMeetingResponse =
            serde_json::from_str(r#"{"success": false, "error": "bad request"}"#).unwrap();
        assert!(!response.is_conflict());
    }

    #[test]
    fn test_optional_request_fields_omitted() {
        let request = CreateBookingRequest {
            service: "Consultation".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time: "14:00".to_string(),
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@ex.com".to_string(),
            customer_phone: None,
            party_size: None,
            notes: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("customer_phone").is_none());
        assert_eq!(json["date"], "2025-06-01");
    }
}
