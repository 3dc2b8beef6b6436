//! Downstream relay with retry scheduling

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tracing::{info, warn};

use crate::domain::audit::{AuditEntry, AuditKind, AuditTrail};
use crate::domain::retry::{RetryPolicy, RetryTask};

use super::ports::Forwarder;

/// Schedules and delivers canonical event bodies downstream.
///
/// First attempts and retries flow through the same pending list. The
/// sweeper drains due tasks, removing each before redispatch so a task
/// is either pending or in-flight, never both; transport failures are
/// rescheduled per the backoff policy until the attempt cap.
pub struct RelayService {
    forwarder: Arc<dyn Forwarder>,
    policy: RetryPolicy,
    audit: Arc<Mutex<AuditTrail>>,
    pending: Mutex<Vec<RetryTask>>,
    nudge: Notify,
}

impl RelayService {
    pub fn new(
        forwarder: Arc<dyn Forwarder>,
        policy: RetryPolicy,
        audit: Arc<Mutex<AuditTrail>>,
    ) -> Self {
        Self {
            forwarder,
            policy,
            audit,
            pending: Mutex::new(Vec::new()),
            nudge: Notify::new(),
        }
    }

    /// Queue a first delivery attempt and wake the sweeper.
    /// Enqueue-and-return: the caller's acknowledgment never waits on
    /// the delivery itself.
    pub fn enqueue(&self, payload: String, request_id: &str) {
        self.pending
            .lock()
            .unwrap()
            .push(RetryTask::first(payload, request_id));
        self.nudge.notify_one();
    }

    /// Number of deliveries awaiting their next attempt
    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Drain every due task and deliver each in turn.
    pub async fn sweep(&self) {
        let now = Instant::now();
        let due: Vec<RetryTask> = {
            let mut pending = self.pending.lock().unwrap();
            let (due, rest) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|task: &RetryTask| task.is_due(now));
            *pending = rest;
            due
        };
        for task in due {
            self.deliver(task).await;
        }
    }

    async fn deliver(&self, task: RetryTask) {
        let outcome = self
            .forwarder
            .deliver(&task.payload, &task.request_id, task.attempt)
            .await;
        match outcome {
            Ok(status) => {
                info!(
                    request_id = %task.request_id,
                    attempt = task.attempt,
                    status,
                    "forwarded downstream"
                );
                self.record(
                    AuditKind::ForwardOk,
                    &task.request_id,
                    format!("status {status} on attempt {}", task.attempt),
                );
            }
            Err(error) => match self.policy.reschedule(&task, Instant::now()) {
                Some(next) => {
                    warn!(
                        request_id = %task.request_id,
                        attempt = task.attempt,
                        error = %error,
                        "forward failed, retry queued"
                    );
                    self.record(
                        AuditKind::ForwardRetryQueued,
                        &task.request_id,
                        format!("attempt {} failed: {error}", task.attempt),
                    );
                    self.pending.lock().unwrap().push(next);
                }
                None => {
                    warn!(
                        request_id = %task.request_id,
                        attempt = task.attempt,
                        error = %error,
                        "forward failed, giving up"
                    );
                    self.record(
                        AuditKind::ForwardFailedFinal,
                        &task.request_id,
                        format!("gave up after {} attempts: {error}", task.attempt),
                    );
                }
            },
        }
    }

    fn record(&self, kind: AuditKind, request_id: &str, detail: String) {
        self.audit
            .lock()
            .unwrap()
            .record(AuditEntry::new(kind, request_id, detail));
    }

    /// Background loop: sweep on a fixed interval and on every enqueue
    /// nudge, whichever comes first.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.nudge.notified() => {}
            }
            self.sweep().await;
        }
    }
}
