//! Prelude module - commonly used types for convenient import.
//!
//! Use `use frontdesk_core::prelude::*;` to import all essential types.

pub use crate::ids::{BookingId, ConversationId, IdError, MeetingId};
pub use crate::pii::hash_pii;
