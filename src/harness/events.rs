use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};

/// One timestamped human-readable workspace event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Bounded, ordered record of workspace events.
///
/// Entries are appended in arrival order and evicted oldest-first once the
/// capacity is exceeded. `entries` returns newest-first for display. Every
/// recorded entry is also fanned out to broadcast subscribers for the live
/// event stream.
pub struct EventLog {
    capacity: usize,
    entries: RwLock<VecDeque<LogEntry>>,
    tx: broadcast::Sender<LogEntry>,
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::new()),
            tx,
        }
    }

    pub async fn record(&self, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            message: message.into(),
        };
        {
            let mut entries = self.entries.write().await;
            entries.push_back(entry.clone());
            while entries.len() > self.capacity {
                entries.pop_front();
            }
        }
        // Best effort; nobody listening is fine.
        let _ = self.tx.send(entry);
    }

    /// All retained entries, newest first.
    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().await.iter().rev().cloned().collect()
    }

    pub async fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_newest_entry_first() {
        let log = EventLog::with_capacity(10);
        log.record("first").await;
        log.record("second").await;
        log.record("third").await;

        let entries = log.entries().await;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "third");
        assert_eq!(entries[2].message, "first");
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let log = EventLog::with_capacity(3);
        for i in 0..4 {
            log.record(format!("event {i}")).await;
        }

        let entries = log.entries().await;
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().all(|e| e.message != "event 0"));
        assert_eq!(entries[0].message, "event 3");
    }

    #[tokio::test]
    async fn test_recent_limits_output() {
        let log = EventLog::with_capacity(10);
        for i in 0..5 {
            log.record(format!("event {i}")).await;
        }

        let recent = log.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "event 4");
        assert_eq!(recent[1].message, "event 3");
    }

    #[tokio::test]
    async fn test_subscribers_receive_entries() {
        let log = EventLog::with_capacity(10);
        let mut rx = log.subscribe();
        log.record("broadcasted").await;

        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.message, "broadcasted");
    }

    #[tokio::test]
    async fn test_timestamps_are_monotone_in_arrival_order() {
        let log = EventLog::with_capacity(10);
        log.record("a").await;
        log.record("b").await;

        let entries = log.entries().await;
        // entries[0] is "b", recorded after "a"
        assert!(entries[0].timestamp >= entries[1].timestamp);
    }
}
