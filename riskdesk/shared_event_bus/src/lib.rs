#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Event bus abstractions used to fan out risk assessments and alerts.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::broadcast};
use uuid::Uuid;

/// Event type emitted after a project has been scored.
pub const RISK_ASSESSED: &str = "risk.assessed";
/// Event type emitted when a score crosses the alert threshold.
pub const RISK_ALERT: &str = "risk.alert";

/// Generic event record encoded as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier (`evt-<uuid>`).
    pub id: String,
    /// Module producing the event.
    pub source: String,
    /// Event type (e.g., `risk.alert`).
    pub event_type: String,
    /// RFC3339 timestamp.
    pub timestamp: String,
    /// Arbitrary JSON payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl EventRecord {
    /// Builds a record stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: format!("evt-{}", Uuid::new_v4()),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            payload,
        }
    }
}

/// Event publisher interface.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event to the bus.
    async fn publish(&self, event: EventRecord) -> Result<()>;
}

/// Event subscriber interface.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Returns a receiver for events published after the call.
    async fn subscribe(&self) -> Result<broadcast::Receiver<EventRecord>>;
}

/// In-memory broadcast bus with a bounded backlog of recent events.
#[derive(Debug, Clone)]
pub struct MemoryEventBus {
    sender: broadcast::Sender<EventRecord>,
    retain: usize,
    backlog: Arc<Mutex<VecDeque<EventRecord>>>,
}

impl MemoryEventBus {
    /// Creates a new bus that buffers and retains up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            retain: capacity,
            backlog: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Snapshot of recent events retained in memory, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.backlog.lock().iter().cloned().collect()
    }

    /// Retained events of the given type.
    #[must_use]
    pub fn events_of_type(&self, event_type: &str) -> Vec<EventRecord> {
        self.backlog
            .lock()
            .iter()
            .filter(|event| event.event_type == event_type)
            .cloned()
            .collect()
    }
}

/// File-backed publisher appending JSON lines.
#[derive(Debug, Clone)]
pub struct FileEventPublisher {
    path: PathBuf,
}

impl FileEventPublisher {
    /// Creates a publisher that appends JSON lines to the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }
}

#[async_trait]
impl EventPublisher for MemoryEventBus {
    async fn publish(&self, event: EventRecord) -> Result<()> {
        {
            let mut backlog = self.backlog.lock();
            backlog.push_back(event.clone());
            while backlog.len() > self.retain {
                backlog.pop_front();
            }
        }
        // no subscribers is not an error
        let _ = self.sender.send(event);
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for MemoryEventBus {
    async fn subscribe(&self) -> Result<broadcast::Receiver<EventRecord>> {
        Ok(self.sender.subscribe())
    }
}

#[async_trait]
impl EventPublisher for FileEventPublisher {
    async fn publish(&self, event: EventRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let mut data = serde_json::to_vec(&event)?;
        data.push(b'\n');
        file.write_all(&data).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn alert_event(project: &str) -> EventRecord {
        EventRecord::new("alerts", RISK_ALERT, json!({ "project_id": project, "overall_risk": 7.4 }))
    }

    #[tokio::test]
    async fn publishes_and_receives() {
        let bus = MemoryEventBus::new(16);
        let mut rx = bus.subscribe().await.unwrap();
        bus.publish(alert_event("p-1")).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, RISK_ALERT);
        assert!(event.id.starts_with("evt-"));
    }

    #[tokio::test]
    async fn backlog_is_bounded() {
        let bus = MemoryEventBus::new(2);
        for project in ["p-1", "p-2", "p-3"] {
            bus.publish(alert_event(project)).await.unwrap();
        }
        let retained = bus.snapshot();
        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].payload["project_id"], json!("p-2"));
    }

    #[tokio::test]
    async fn filters_by_type() {
        let bus = MemoryEventBus::new(8);
        bus.publish(alert_event("p-1")).await.unwrap();
        bus.publish(EventRecord::new("assessment", RISK_ASSESSED, json!({})))
            .await
            .unwrap();
        assert_eq!(bus.events_of_type(RISK_ASSESSED).len(), 1);
        assert_eq!(bus.events_of_type(RISK_ALERT).len(), 1);
    }

    #[tokio::test]
    async fn file_publisher_writes_events() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events/risk.jsonl");
        let publisher = FileEventPublisher::new(&path).unwrap();
        publisher.publish(alert_event("p-9")).await.unwrap();
        publisher.publish(alert_event("p-10")).await.unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("p-10"));
    }
}
