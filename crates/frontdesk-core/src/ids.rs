//! Opaque identifiers used across the runtime.
//!
//! Conversation ids are minted by the NLU front-end and treated as opaque.
//! Booking and meeting ids are owned by the upstream backend; bookings use
//! the `BK-DDDD-DDDD` reference format and are normalized on parse.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing identifiers.
#[derive(Debug, Error)]
pub enum IdError {
    /// The candidate does not match the booking reference format.
    #[error("invalid booking reference: {candidate}")]
    InvalidBookingId {
        /// The rejected input.
        candidate: String,
    },
}

/// Opaque conversation identifier, assigned by the NLU front-end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Wrap a sender id from the front-end.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Normalized booking reference (`BK-DDDD-DDDD`).
///
/// The backend owns booking records; the runtime only carries their
/// references. Parsing accepts the loose forms users type (`bk12345678`,
/// `BK-1234 5678`, `1234-5678`) and normalizes to the canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Parse and normalize a booking reference.
    ///
    /// Accepts an optional `BK` prefix and optional hyphens/spaces between
    /// the two 4-digit groups. Anything else is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidBookingId`] if the candidate does not
    /// contain exactly eight digits in two groups after stripping.
    pub fn parse(candidate: &str) -> Result<Self, IdError> {
        let trimmed = candidate.trim();
        let upper = trimmed.to_uppercase();
        let rest = upper.strip_prefix("BK").unwrap_or(&upper);
        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();

        let separators_only = rest
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == ' ');

        if digits.len() == 8 && separators_only {
            Ok(Self(format!("BK-{}-{}", &digits[..4], &digits[4..])))
        } else {
            Err(IdError::InvalidBookingId {
                candidate: trimmed.to_string(),
            })
        }
    }

    /// The canonical `BK-DDDD-DDDD` reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookingId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Opaque meeting identifier, owned by the upstream backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(pub String);

impl MeetingId {
    /// Wrap a meeting id returned by the backend.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
