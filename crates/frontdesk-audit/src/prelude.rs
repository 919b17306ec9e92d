//! Prelude module - commonly used types for convenient import.
//!
//! Use `use frontdesk_audit::prelude::*;` to import all essential types.

pub use crate::entry::{AuditEvent, AuditStatus, InteractionRecord};
pub use crate::error::{AuditError, AuditResult};
pub use crate::log::AuditLog;
pub use crate::sink::{AuditSink, FileSink, MemorySink};
