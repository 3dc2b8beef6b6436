//! Shared application state for the HTTP surface

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::application::{IngressUseCase, RelayService, TranscribeUseCase};
use crate::domain::admission::RateLimiter;
use crate::domain::audit::AuditTrail;
use crate::domain::config::RelayConfig;
use crate::domain::event_store::LatestEvents;

/// Everything the handlers share. Services are Arc'd; the mutable
/// structures sit behind coarse per-structure locks with no
/// cross-structure transactions.
#[derive(Clone)]
pub struct AppState {
    pub ingress: Arc<IngressUseCase>,
    pub relay: Arc<RelayService>,
    pub transcribe: Arc<TranscribeUseCase>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    pub audit: Arc<Mutex<AuditTrail>>,
    pub latest: Arc<Mutex<LatestEvents>>,
    pub proxy_client: reqwest::Client,
    pub proxy_allowed_hosts: Arc<HashSet<String>>,
    pub recordings_configured: bool,
}

/// Hosts the audio proxy may fetch from: the configured list plus the
/// recording server itself. Hostnames compare case-insensitively, so
/// everything is stored lowercased. An empty set disables the proxy.
pub fn proxy_allow_set(config: &RelayConfig) -> HashSet<String> {
    let mut hosts: HashSet<String> = config
        .proxy_allowed_hosts_or_default()
        .into_iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    if let Some(base) = config.recording_base_url() {
        if let Ok(url) = reqwest::Url::parse(base) {
            if let Some(host) = url.host_str() {
                hosts.insert(host.to_ascii_lowercase());
            }
        }
    }
    hosts
}
