//! Retry scheduling for downstream delivery

use std::time::{Duration, Instant};

/// One pending delivery attempt for the canonical event body.
///
/// Attempt numbers are 1-based and strictly increasing per logical event;
/// the task is dropped once the policy cap is exceeded.
#[derive(Debug, Clone)]
pub struct RetryTask {
    /// Canonical encoded body to deliver
    pub payload: String,
    /// Correlation id from the originating ingress call
    pub request_id: String,
    /// 1-based attempt number
    pub attempt: u32,
    /// Earliest time this attempt may run
    pub not_before: Instant,
}

impl RetryTask {
    /// A first-attempt task, due immediately.
    pub fn first(payload: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            request_id: request_id.into(),
            attempt: 1,
            not_before: Instant::now(),
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.not_before <= now
    }
}

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self { base, max_attempts }
    }

    /// Delay inserted after attempt number `attempt` fails:
    /// `base * 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Schedule the follow-up attempt for a failed task, or None once the
    /// attempt cap is reached.
    pub fn reschedule(&self, task: &RetryTask, now: Instant) -> Option<RetryTask> {
        if task.attempt >= self.max_attempts {
            return None;
        }
        Some(RetryTask {
            payload: task.payload.clone(),
            request_id: task.request_id.clone(),
            attempt: task.attempt + 1,
            not_before: now + self.delay_for(task.attempt),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_is_due_immediately() {
        let task = RetryTask::first("src=1001", "req-0001");
        assert_eq!(task.attempt, 1);
        assert!(task.is_due(Instant::now()));
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(Duration::from_secs(5), 5);
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(20));
        assert_eq!(policy.delay_for(4), Duration::from_secs(40));
    }

    #[test]
    fn reschedule_increments_attempt_and_applies_backoff() {
        let policy = RetryPolicy::new(Duration::from_secs(5), 5);
        let now = Instant::now();
        let task = RetryTask::first("src=1001", "req-0001");

        let next = policy.reschedule(&task, now).unwrap();
        assert_eq!(next.attempt, 2);
        assert_eq!(next.not_before, now + Duration::from_secs(5));
        assert!(!next.is_due(now));

        let third = policy.reschedule(&next, now).unwrap();
        assert_eq!(third.attempt, 3);
        assert_eq!(third.not_before, now + Duration::from_secs(10));
    }

    #[test]
    fn reschedule_stops_at_the_attempt_cap() {
        let policy = RetryPolicy::new(Duration::from_secs(5), 3);
        let now = Instant::now();
        let task = RetryTask {
            payload: "src=1001".to_string(),
            request_id: "req-0001".to_string(),
            attempt: 3,
            not_before: now,
        };
        assert!(policy.reschedule(&task, now).is_none());
    }

    #[test]
    fn task_due_exactly_at_not_before() {
        let now = Instant::now();
        let task = RetryTask {
            payload: String::new(),
            request_id: String::new(),
            attempt: 1,
            not_before: now,
        };
        assert!(task.is_due(now));
        assert!(!task.is_due(now - Duration::from_millis(1)));
    }
}
