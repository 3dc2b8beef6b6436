//! Accept call event use case

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::admission::{IpAllowList, RateLimiter};
use crate::domain::audit::{AuditEntry, AuditKind, AuditTrail};
use crate::domain::call_event::{CallEvent, IngressPayload};
use crate::domain::event_store::LatestEvents;

use super::relay::RelayService;

/// Terminal admission failures, one response status each
#[derive(Debug, Clone, Error)]
pub enum AdmissionError {
    #[error("Source address not allowed")]
    IpNotAllowed,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Body exceeds maximum size")]
    BodyTooLarge,

    #[error("Empty body")]
    EmptyBody,
}

/// What ingress reports back to the originator on acceptance
#[derive(Debug, Clone)]
pub struct AcceptedEvent {
    pub request_id: String,
    pub src: String,
    pub dst: String,
    pub userfield: String,
    pub callid: String,
}

/// Admission pipeline for inbound call events.
///
/// Checks run in a fixed order; each terminal branch writes exactly one
/// audit entry. Acceptance stores the latest raw event and enqueues the
/// canonical body with the relay, never waiting on delivery.
pub struct IngressUseCase {
    allow_list: IpAllowList,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    audit: Arc<Mutex<AuditTrail>>,
    latest: Arc<Mutex<LatestEvents>>,
    relay: Arc<RelayService>,
    max_body_bytes: usize,
}

impl IngressUseCase {
    pub fn new(
        allow_list: IpAllowList,
        rate_limiter: Arc<Mutex<RateLimiter>>,
        audit: Arc<Mutex<AuditTrail>>,
        latest: Arc<Mutex<LatestEvents>>,
        relay: Arc<RelayService>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            allow_list,
            rate_limiter,
            audit,
            latest,
            relay,
            max_body_bytes,
        }
    }

    /// Accept one inbound event.
    ///
    /// # Arguments
    /// * `remote_addr` - Source socket address, port included
    /// * `payload` - Body as received, form or JSON
    /// * `request_id` - Correlation id minted by the delivery layer
    pub fn accept(
        &self,
        remote_addr: &str,
        payload: IngressPayload,
        request_id: &str,
    ) -> Result<AcceptedEvent, AdmissionError> {
        if !self.allow_list.is_address_allowed(remote_addr) {
            warn!(request_id, remote_addr, "rejected: address not allowed");
            self.record(
                AuditKind::RejectedIp,
                request_id,
                format!("address {remote_addr}"),
            );
            return Err(AdmissionError::IpNotAllowed);
        }

        if !self.rate_limiter.lock().unwrap().check(remote_addr) {
            warn!(request_id, remote_addr, "rejected: rate limit exceeded");
            self.record(
                AuditKind::RejectedRate,
                request_id,
                format!("address {remote_addr}"),
            );
            return Err(AdmissionError::RateLimited);
        }

        let canonical = match payload.canonicalize() {
            Ok(body) => body,
            Err(error) => {
                warn!(request_id, %error, "rejected: unusable payload");
                self.record(AuditKind::RejectedEmpty, request_id, error.to_string());
                return Err(AdmissionError::EmptyBody);
            }
        };

        if canonical.len() > self.max_body_bytes {
            warn!(
                request_id,
                bytes = canonical.len(),
                "rejected: body too large"
            );
            self.record(
                AuditKind::RejectedOversize,
                request_id,
                format!("{} bytes", canonical.len()),
            );
            return Err(AdmissionError::BodyTooLarge);
        }

        if canonical.trim().is_empty() {
            warn!(request_id, "rejected: empty body");
            self.record(AuditKind::RejectedEmpty, request_id, "empty body".to_string());
            return Err(AdmissionError::EmptyBody);
        }

        let event = CallEvent::from_encoded(&canonical);
        info!(
            request_id,
            src = %event.src,
            dst = %event.dst,
            userfield = %event.userfield,
            "event accepted"
        );
        self.record(AuditKind::Accepted, request_id, event.summary());

        let accepted = AcceptedEvent {
            request_id: request_id.to_string(),
            src: event.src.clone(),
            dst: event.dst.clone(),
            userfield: event.userfield.clone(),
            callid: event.callid.clone(),
        };

        self.latest
            .lock()
            .unwrap()
            .store_raw(event, canonical.clone());
        self.relay.enqueue(canonical, request_id);

        Ok(accepted)
    }

    fn record(&self, kind: AuditKind, request_id: &str, detail: String) {
        self.audit
            .lock()
            .unwrap()
            .record(AuditEntry::new(kind, request_id, detail));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ForwardError, Forwarder};
    use crate::domain::retry::RetryPolicy;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingForwarder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Forwarder for CountingForwarder {
        async fn deliver(
            &self,
            _payload: &str,
            _request_id: &str,
            _attempt: u32,
        ) -> Result<u16, ForwardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(200)
        }
    }

    struct Fixture {
        ingress: IngressUseCase,
        audit: Arc<Mutex<AuditTrail>>,
        latest: Arc<Mutex<LatestEvents>>,
        relay: Arc<RelayService>,
        forwarder: Arc<CountingForwarder>,
    }

    fn fixture(allowed_ips: Vec<String>, max_requests: usize, max_body_bytes: usize) -> Fixture {
        let audit = Arc::new(Mutex::new(AuditTrail::new(50)));
        let latest = Arc::new(Mutex::new(LatestEvents::new()));
        let forwarder = Arc::new(CountingForwarder {
            calls: AtomicUsize::new(0),
        });
        let relay = Arc::new(RelayService::new(
            Arc::clone(&forwarder) as Arc<dyn Forwarder>,
            RetryPolicy::new(Duration::from_secs(5), 5),
            Arc::clone(&audit),
        ));
        let ingress = IngressUseCase::new(
            IpAllowList::new(allowed_ips),
            Arc::new(Mutex::new(RateLimiter::new(
                Duration::from_secs(60),
                max_requests,
            ))),
            Arc::clone(&audit),
            Arc::clone(&latest),
            Arc::clone(&relay),
            max_body_bytes,
        );
        Fixture {
            ingress,
            audit,
            latest,
            relay,
            forwarder,
        }
    }

    fn audit_kinds(audit: &Arc<Mutex<AuditTrail>>) -> Vec<AuditKind> {
        audit
            .lock()
            .unwrap()
            .recent(50)
            .iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn accepts_and_enqueues_a_form_event() {
        let f = fixture(Vec::new(), 10, 64 * 1024);
        let payload = IngressPayload::FormEncoded(
            "src=1001099&dst=16981317956&userfield=ABC123&disposition=ANSWER".to_string(),
        );

        let accepted = f.ingress.accept("10.0.0.7:5060", payload, "req-0001").unwrap();
        assert_eq!(accepted.userfield, "ABC123");
        assert_eq!(accepted.src, "1001099");

        assert_eq!(audit_kinds(&f.audit), vec![AuditKind::Accepted]);
        assert_eq!(f.relay.pending_len(), 1);
        assert!(f.latest.lock().unwrap().latest_raw().is_some());
        // Enqueued, not yet delivered
        assert_eq!(f.forwarder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn accepts_a_json_event() {
        let f = fixture(Vec::new(), 10, 64 * 1024);
        let payload = IngressPayload::Json(json!({"src": "1001", "userfield": "XYZ9"}));

        let accepted = f.ingress.accept("10.0.0.7", payload, "req-0001").unwrap();
        assert_eq!(accepted.userfield, "XYZ9");
    }

    #[test]
    fn disallowed_address_is_rejected_without_forwarding() {
        let f = fixture(vec!["10.0.0.7".to_string()], 10, 64 * 1024);
        let payload = IngressPayload::FormEncoded("src=1001".to_string());

        let result = f.ingress.accept("203.0.113.9:5060", payload, "req-0001");
        assert!(matches!(result, Err(AdmissionError::IpNotAllowed)));
        assert_eq!(audit_kinds(&f.audit), vec![AuditKind::RejectedIp]);
        assert_eq!(f.relay.pending_len(), 0);
        assert!(f.latest.lock().unwrap().latest_raw().is_none());
    }

    #[test]
    fn rate_limit_rejects_the_excess() {
        let f = fixture(Vec::new(), 2, 64 * 1024);
        for i in 0..2 {
            let payload = IngressPayload::FormEncoded(format!("src=100{i}"));
            f.ingress
                .accept("10.0.0.7:5060", payload, &format!("req-000{i}"))
                .unwrap();
        }
        let result = f.ingress.accept(
            "10.0.0.7:5060",
            IngressPayload::FormEncoded("src=1003".to_string()),
            "req-0003",
        );
        assert!(matches!(result, Err(AdmissionError::RateLimited)));
        assert_eq!(
            audit_kinds(&f.audit),
            vec![
                AuditKind::Accepted,
                AuditKind::Accepted,
                AuditKind::RejectedRate
            ]
        );
        assert_eq!(f.relay.pending_len(), 2);
    }

    #[test]
    fn oversize_body_is_rejected_without_forwarding() {
        let f = fixture(Vec::new(), 10, 32);
        let payload = IngressPayload::FormEncoded(format!("src={}", "9".repeat(100)));

        let result = f.ingress.accept("10.0.0.7", payload, "req-0001");
        assert!(matches!(result, Err(AdmissionError::BodyTooLarge)));
        assert_eq!(audit_kinds(&f.audit), vec![AuditKind::RejectedOversize]);
        assert_eq!(f.relay.pending_len(), 0);
    }

    #[test]
    fn empty_body_is_rejected() {
        let f = fixture(Vec::new(), 10, 64 * 1024);
        let payload = IngressPayload::FormEncoded("   ".to_string());

        let result = f.ingress.accept("10.0.0.7", payload, "req-0001");
        assert!(matches!(result, Err(AdmissionError::EmptyBody)));
        assert_eq!(audit_kinds(&f.audit), vec![AuditKind::RejectedEmpty]);
    }

    #[test]
    fn non_object_json_is_rejected_as_empty() {
        let f = fixture(Vec::new(), 10, 64 * 1024);
        let payload = IngressPayload::Json(json!(["not", "an", "object"]));

        let result = f.ingress.accept("10.0.0.7", payload, "req-0001");
        assert!(matches!(result, Err(AdmissionError::EmptyBody)));
        assert_eq!(audit_kinds(&f.audit), vec![AuditKind::RejectedEmpty]);
    }

    #[test]
    fn identical_bodies_are_accepted_independently() {
        let f = fixture(Vec::new(), 10, 64 * 1024);
        for i in 0..2 {
            let payload = IngressPayload::FormEncoded("src=1001&userfield=SAME".to_string());
            f.ingress
                .accept("10.0.0.7", payload, &format!("req-000{i}"))
                .unwrap();
        }
        assert_eq!(
            audit_kinds(&f.audit),
            vec![AuditKind::Accepted, AuditKind::Accepted]
        );
        assert_eq!(f.relay.pending_len(), 2);
    }
}
