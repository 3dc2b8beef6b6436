//! Bounded audit trail of pipeline decisions

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One kind of admission or delivery decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditKind {
    #[serde(rename = "accepted")]
    Accepted,
    #[serde(rename = "rejected-ip")]
    RejectedIp,
    #[serde(rename = "rejected-rate-limited")]
    RejectedRate,
    #[serde(rename = "rejected-oversize")]
    RejectedOversize,
    #[serde(rename = "rejected-empty")]
    RejectedEmpty,
    #[serde(rename = "forwarded-ok")]
    ForwardOk,
    #[serde(rename = "forward-retry-queued")]
    ForwardRetryQueued,
    #[serde(rename = "forward-failed-final")]
    ForwardFailedFinal,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::RejectedIp => "rejected-ip",
            Self::RejectedRate => "rejected-rate-limited",
            Self::RejectedOversize => "rejected-oversize",
            Self::RejectedEmpty => "rejected-empty",
            Self::ForwardOk => "forwarded-ok",
            Self::ForwardRetryQueued => "forward-retry-queued",
            Self::ForwardFailedFinal => "forward-failed-final",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One timestamped pipeline decision. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub kind: AuditKind,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub detail: String,
}

impl AuditEntry {
    pub fn new(kind: AuditKind, request_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            kind,
            request_id: request_id.into(),
            detail: detail.into(),
        }
    }
}

/// Per-kind tallies for the stats endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCounts {
    pub accepted: usize,
    pub forwarded_ok: usize,
    pub forward_failed: usize,
    pub forward_retry_queued: usize,
}

/// FIFO ring of recent decisions, bounded by a configured cap.
#[derive(Debug)]
pub struct AuditTrail {
    cap: usize,
    entries: VecDeque<AuditEntry>,
}

impl AuditTrail {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap.min(1024)),
        }
    }

    /// Append an entry, evicting from the front when over the cap.
    pub fn record(&mut self, entry: AuditEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// The most recent `limit` entries, oldest-to-newest within the slice.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Tally entries recorded at or after the cutoff.
    pub fn counts_since(&self, cutoff: DateTime<Utc>) -> AuditCounts {
        let mut counts = AuditCounts::default();
        for entry in self.entries.iter().rev() {
            if entry.at < cutoff {
                break;
            }
            match entry.kind {
                AuditKind::Accepted => counts.accepted += 1,
                AuditKind::ForwardOk => counts.forwarded_ok += 1,
                AuditKind::ForwardFailedFinal => counts.forward_failed += 1,
                AuditKind::ForwardRetryQueued => counts.forward_retry_queued += 1,
                _ => {}
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
