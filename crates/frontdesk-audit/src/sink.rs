//! Audit sink trait and backends.
//!
//! The durable backend is a JSONL append file; an in-memory backend
//! supports tests. Both are thread-safe and append-only.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

use crate::entry::{AuditEvent, InteractionRecord};
use crate::error::{AuditError, AuditResult};

/// Durable backend for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append an action record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted. Callers going
    /// through [`crate::AuditLog`] never see this error; it is logged and
    /// swallowed there.
    async fn append(&self, event: &AuditEvent) -> AuditResult<()>;

    /// Append a high-volume interaction record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    async fn append_interaction(&self, record: &InteractionRecord) -> AuditResult<()>;
}

/// JSONL file sink.
///
/// Writes action records to `audit.jsonl` and interaction records to
/// `interactions.jsonl` inside the configured directory. The directory
/// and files are created on first write if absent.
pub struct FileSink {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSink {
    /// Create a sink rooted at `dir`. Nothing is touched on disk until
    /// the first append.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn append_line(&self, file_name: &str, line: String) -> AuditResult<()> {
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file_name))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for FileSink {
    async fn append(&self, event: &AuditEvent) -> AuditResult<()> {
        let line = serde_json::to_string(event)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        self.append_line("audit.jsonl", line).await
    }

    async fn append_interaction(&self, record: &InteractionRecord) -> AuditResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;
        self.append_line("interactions.jsonl", line).await
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink").field("dir", &self.dir).finish()
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
    interactions: Mutex<Vec<InteractionRecord>>,
}

impl MemorySink {
    /// Create an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded action events.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink lock poisoned").clone()
    }

    /// Snapshot of recorded interaction records.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn interactions(&self) -> Vec<InteractionRecord> {
        self.interactions
            .lock()
            .expect("audit sink lock poisoned")
            .clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn append(&self, event: &AuditEvent) -> AuditResult<()> {
        self.events
            .lock()
            .expect("audit sink lock poisoned")
            .push(event.clone());
        Ok(())
    }

    async fn append_interaction(&self, record: &InteractionRecord) -> AuditResult<()> {
        self.interactions
            .lock()
            .expect("audit sink lock poisoned")
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditStatus;
    use frontdesk_core::ConversationId;

    #[tokio::test]
    async fn test_file_sink_creates_on_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("logs");
        let sink = FileSink::new(&root);

        assert!(!root.exists());

        let event = AuditEvent::new(
            "create_booking",
            ConversationId::from("c1"),
            AuditStatus::Success,
        );
        sink.append(&event).await.unwrap();

        let contents = std::fs::read_to_string(root.join("audit.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let parsed: AuditEvent = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.action, "create_booking");
    }

    #[tokio::test]
    async fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());

        for i in 0..3 {
            let event = AuditEvent::new(
                format!("action_{i}"),
                ConversationId::from("c1"),
                AuditStatus::Logged,
            );
            sink.append(&event).await.unwrap();
        }

        let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_interactions_go_to_separate_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());

        sink.append_interaction(&InteractionRecord::new("greet", 0.99, 0, 0))
            .await
            .unwrap();

        assert!(dir.path().join("interactions.jsonl").exists());
        assert!(!dir.path().join("audit.jsonl").exists());
    }
}
