//! Latest-event slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::call_event::CallEvent;

/// The most recent raw event as accepted on ingress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event: CallEvent,
    pub body: String,
    #[serde(rename = "receivedAt")]
    pub received_at: DateTime<Utc>,
}

/// The most recent enriched event pushed by the external normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub payload: serde_json::Value,
    #[serde(rename = "storedAt")]
    pub stored_at: DateTime<Utc>,
}

/// Two independent "latest" slots, no history.
/// A newer event supersedes the slot; entries are never mutated in place.
#[derive(Debug, Default)]
pub struct LatestEvents {
    raw: Option<StoredEvent>,
    processed: Option<ProcessedEvent>,
}

impl LatestEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest raw event with a fresh timestamp.
    pub fn store_raw(&mut self, event: CallEvent, body: String) {
        self.raw = Some(StoredEvent {
            event,
            body,
            received_at: Utc::now(),
        });
    }

    /// Replace the latest processed event with a fresh timestamp.
    pub fn store_processed(&mut self, payload: serde_json::Value) {
        self.processed = Some(ProcessedEvent {
            payload,
            stored_at: Utc::now(),
        });
    }

    pub fn latest_raw(&self) -> Option<&StoredEvent> {
        self.raw.as_ref()
    }

    pub fn latest_processed(&self) -> Option<&ProcessedEvent> {
        self.processed.as_ref()
    }
}
