//! Best-effort audit log facade.
//!
//! Every record goes to two sinks: the durable backend and the process
//! logger. A failure in either sink is itself logged and swallowed; audit
//! writes never propagate errors into the action that emitted them.

use std::sync::Arc;
use tracing::{info, warn};

use crate::entry::{AuditEvent, InteractionRecord};
use crate::sink::AuditSink;

/// The audit log.
///
/// Cheap to clone; the sink handle is shared.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
}

impl AuditLog {
    /// Create a log writing to the given durable sink.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record an action. Never fails.
    pub async fn log_action(&self, event: AuditEvent) {
        info!(
            action = %event.action,
            conversation_id = %event.conversation_id,
            status = %event.status,
            booking_id = event.booking_id.as_deref(),
            meeting_id = event.meeting_id.as_deref(),
            data_hash = event.data_hash.as_deref(),
            error = event.error.as_deref(),
            "audit"
        );

        if let Err(e) = self.sink.append(&event).await {
            warn!(action = %event.action, error = %e, "audit sink write failed");
        }
    }

    /// Record the shape of a classified turn. Never fails.
    ///
    /// Only the intent name, rounded confidence, entity count, and filled
    /// important-slot count are stored - no message content.
    pub async fn log_interaction(
        &self,
        intent: &str,
        confidence: f64,
        entity_count: usize,
        filled_slots: usize,
    ) {
        let record = InteractionRecord::new(intent, confidence, entity_count, filled_slots);

        info!(
            intent = %record.intent,
            confidence = record.confidence,
            entity_count = record.entity_count,
            filled_slots = record.filled_slots,
            "interaction"
        );

        if let Err(e) = self.sink.append_interaction(&record).await {
            warn!(intent = %record.intent, error = %e, "interaction sink write failed");
        }
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditStatus;
    use crate::error::{AuditError, AuditResult};
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use frontdesk_core::ConversationId;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _event: &AuditEvent) -> AuditResult<()> {
            Err(AuditError::Serialization("boom".to_string()))
        }

        async fn append_interaction(&self, _record: &InteractionRecord) -> AuditResult<()> {
            Err(AuditError::Serialization("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let log = AuditLog::new(Arc::new(FailingSink));
        // Must not panic or return an error.
        log.log_action(AuditEvent::new(
            "create_booking",
            ConversationId::from("c1"),
            AuditStatus::Failed,
        ))
        .await;
        log.log_interaction("greet", 0.9, 0, 0).await;
    }

    #[tokio::test]
    async fn test_records_reach_sink() {
        let sink = Arc::new(MemorySink::new());
        let log = AuditLog::new(sink.clone());

        log.log_action(
            AuditEvent::new(
                "cancel_booking",
                ConversationId::from("c1"),
                AuditStatus::Success,
            )
            .with_booking_id("BK-1234-5678"),
        )
        .await;
        log.log_interaction("cancel_booking", 0.87654, 1, 1).await;

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].booking_id.as_deref(), Some("BK-1234-5678"));

        let interactions = sink.interactions();
        assert_eq!(interactions.len(), 1);
        assert!((interactions[0].confidence - 0.877).abs() < f64::EPSILON);
    }
}
