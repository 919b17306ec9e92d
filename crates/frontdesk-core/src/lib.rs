#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Frontdesk Core - shared primitives for the dialogue action runtime.
//!
//! This crate provides:
//! - Opaque identifiers (`ConversationId`, `BookingId`, `MeetingId`)
//! - Booking reference normalization (`BK-DDDD-DDDD`)
//! - PII hashing for audit records
//!
//! It has no dependencies on other internal frontdesk crates; every other
//! crate in the workspace may depend on it.

pub mod ids;
pub mod pii;
pub mod prelude;

pub use ids::{BookingId, ConversationId, IdError, MeetingId};
pub use pii::hash_pii;
