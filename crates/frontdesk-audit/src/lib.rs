#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Frontdesk Audit - append-only structured audit logging.
//!
//! This crate provides:
//! - [`AuditEvent`] records for every action the runtime performs
//! - Metadata sanitization (secrets dropped, PII replaced by hashes)
//! - An [`AuditSink`] trait with durable JSONL and in-memory backends
//! - A best-effort [`AuditLog`] facade that never raises
//!
//! # PII Model
//!
//! An audit record never contains a raw email, phone number, or personal
//! name. Metadata keys that carry PII are rewritten to `<key>_hash`
//! holding the first 16 hex characters of SHA-256 over the value; keys
//! that look like secrets are dropped outright.
//!
//! # Example
//!
//! ```
//! use frontdesk_audit::{AuditEvent, AuditLog, AuditStatus, MemorySink};
//! use frontdesk_core::ConversationId;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let sink = Arc::new(MemorySink::new());
//! let log = AuditLog::new(sink.clone());
//!
//! let event = AuditEvent::new(
//!     "create_booking",
//!     ConversationId::from("conv-1"),
//!     AuditStatus::Success,
//! )
//! .with_booking_id("BK-0001-0002");
//!
//! log.log_action(event).await;
//! assert_eq!(sink.events().len(), 1);
//! # }
//! ```

pub mod prelude;

mod entry;
mod error;
mod log;
mod sanitize;
mod sink;

pub use entry::{AuditEvent, AuditStatus, InteractionRecord};
pub use error::{AuditError, AuditResult};
pub use log::AuditLog;
pub use sanitize::sanitize_metadata;
pub use sink::{AuditSink, FileSink, MemorySink};
