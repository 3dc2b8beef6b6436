//! Service configuration value object

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default listen address
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Default sliding-window length for the per-address rate limiter
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;

/// Default number of accepted events per address per window
pub const DEFAULT_RATE_MAX_REQUESTS: usize = 30;

/// Default maximum ingress body size in bytes
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Default audit trail capacity
pub const DEFAULT_AUDIT_CAP: usize = 500;

/// Default per-delivery timeout for downstream forwarding
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 10;

/// Default base delay for the exponential retry backoff
pub const DEFAULT_RETRY_BASE_SECS: u64 = 5;

/// Default maximum delivery attempts per event
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;

/// Default period of the pending-retry sweep
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3;

/// Default recording download timeout
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Default audio proxy timeout
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 30;

/// Default file extension served for same-day recordings
pub const DEFAULT_LIVE_EXTENSION: &str = "wav";

/// Default file extension for transcoded/archived recordings
pub const DEFAULT_ARCHIVE_EXTENSION: &str = "mp3";

/// Default transcript language tag reported to callers
pub const DEFAULT_LANGUAGE: &str = "pt-BR";

/// Ingress admission settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngressConfig {
    pub allowed_ips: Option<Vec<String>>,
    pub rate_window_secs: Option<u64>,
    pub rate_max_requests: Option<usize>,
    pub max_body_bytes: Option<usize>,
    pub audit_cap: Option<usize>,
}

/// Downstream forwarding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwardingConfig {
    pub downstream_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry_base_secs: Option<u64>,
    pub retry_max_attempts: Option<u32>,
    pub sweep_interval_secs: Option<u64>,
}

/// Recording storage settings for the audio locator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingsConfig {
    pub base_url: Option<String>,
    pub live_extension: Option<String>,
    pub archive_extension: Option<String>,
    pub download_timeout_secs: Option<u64>,
}

/// Transcription settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub language: Option<String>,
    pub tenants_file: Option<String>,
}

/// Audio proxy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub allowed_hosts: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

/// Service configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    pub bind: Option<String>,
    pub ingress: Option<IngressConfig>,
    pub forwarding: Option<ForwardingConfig>,
    pub recordings: Option<RecordingsConfig>,
    pub transcription: Option<TranscriptionConfig>,
    pub proxy: Option<ProxyConfig>,
}

impl RelayConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            bind: Some(DEFAULT_BIND.to_string()),
            ingress: Some(IngressConfig {
                allowed_ips: Some(Vec::new()),
                rate_window_secs: Some(DEFAULT_RATE_WINDOW_SECS),
                rate_max_requests: Some(DEFAULT_RATE_MAX_REQUESTS),
                max_body_bytes: Some(DEFAULT_MAX_BODY_BYTES),
                audit_cap: Some(DEFAULT_AUDIT_CAP),
            }),
            forwarding: Some(ForwardingConfig {
                downstream_url: None,
                timeout_secs: Some(DEFAULT_FORWARD_TIMEOUT_SECS),
                retry_base_secs: Some(DEFAULT_RETRY_BASE_SECS),
                retry_max_attempts: Some(DEFAULT_RETRY_MAX_ATTEMPTS),
                sweep_interval_secs: Some(DEFAULT_SWEEP_INTERVAL_SECS),
            }),
            recordings: Some(RecordingsConfig {
                base_url: None,
                live_extension: Some(DEFAULT_LIVE_EXTENSION.to_string()),
                archive_extension: Some(DEFAULT_ARCHIVE_EXTENSION.to_string()),
                download_timeout_secs: Some(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            }),
            transcription: Some(TranscriptionConfig {
                language: Some(DEFAULT_LANGUAGE.to_string()),
                tenants_file: None,
            }),
            proxy: Some(ProxyConfig {
                allowed_hosts: Some(Vec::new()),
                timeout_secs: Some(DEFAULT_PROXY_TIMEOUT_SECS),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            bind: other.bind.or(self.bind),
            ingress: merge_section(self.ingress, other.ingress, |b, o| IngressConfig {
                allowed_ips: o.allowed_ips.or(b.allowed_ips),
                rate_window_secs: o.rate_window_secs.or(b.rate_window_secs),
                rate_max_requests: o.rate_max_requests.or(b.rate_max_requests),
                max_body_bytes: o.max_body_bytes.or(b.max_body_bytes),
                audit_cap: o.audit_cap.or(b.audit_cap),
            }),
            forwarding: merge_section(self.forwarding, other.forwarding, |b, o| {
                ForwardingConfig {
                    downstream_url: o.downstream_url.or(b.downstream_url),
                    timeout_secs: o.timeout_secs.or(b.timeout_secs),
                    retry_base_secs: o.retry_base_secs.or(b.retry_base_secs),
                    retry_max_attempts: o.retry_max_attempts.or(b.retry_max_attempts),
                    sweep_interval_secs: o.sweep_interval_secs.or(b.sweep_interval_secs),
                }
            }),
            recordings: merge_section(self.recordings, other.recordings, |b, o| {
                RecordingsConfig {
                    base_url: o.base_url.or(b.base_url),
                    live_extension: o.live_extension.or(b.live_extension),
                    archive_extension: o.archive_extension.or(b.archive_extension),
                    download_timeout_secs: o.download_timeout_secs.or(b.download_timeout_secs),
                }
            }),
            transcription: merge_section(self.transcription, other.transcription, |b, o| {
                TranscriptionConfig {
                    language: o.language.or(b.language),
                    tenants_file: o.tenants_file.or(b.tenants_file),
                }
            }),
            proxy: merge_section(self.proxy, other.proxy, |b, o| ProxyConfig {
                allowed_hosts: o.allowed_hosts.or(b.allowed_hosts),
                timeout_secs: o.timeout_secs.or(b.timeout_secs),
            }),
        }
    }

    /// Get the listen address, or the default if not set
    pub fn bind_or_default(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    /// Get the ingress allow-list; empty means the check is disabled
    pub fn allowed_ips_or_default(&self) -> Vec<String> {
        self.ingress
            .as_ref()
            .and_then(|i| i.allowed_ips.clone())
            .unwrap_or_default()
    }

    /// Get the rate-limit window length
    pub fn rate_window_or_default(&self) -> Duration {
        Duration::from_secs(
            self.ingress
                .as_ref()
                .and_then(|i| i.rate_window_secs)
                .unwrap_or(DEFAULT_RATE_WINDOW_SECS),
        )
    }

    /// Get the max accepted events per address per window
    pub fn rate_max_or_default(&self) -> usize {
        self.ingress
            .as_ref()
            .and_then(|i| i.rate_max_requests)
            .unwrap_or(DEFAULT_RATE_MAX_REQUESTS)
    }

    /// Get the maximum ingress body size in bytes
    pub fn max_body_bytes_or_default(&self) -> usize {
        self.ingress
            .as_ref()
            .and_then(|i| i.max_body_bytes)
            .unwrap_or(DEFAULT_MAX_BODY_BYTES)
    }

    /// Get the audit trail capacity
    pub fn audit_cap_or_default(&self) -> usize {
        self.ingress
            .as_ref()
            .and_then(|i| i.audit_cap)
            .unwrap_or(DEFAULT_AUDIT_CAP)
    }

    /// Get the downstream URL, if configured
    pub fn downstream_url(&self) -> Option<&str> {
        self.forwarding
            .as_ref()
            .and_then(|f| f.downstream_url.as_deref())
    }

    /// Get the per-delivery forwarding timeout
    pub fn forward_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.forwarding
                .as_ref()
                .and_then(|f| f.timeout_secs)
                .unwrap_or(DEFAULT_FORWARD_TIMEOUT_SECS),
        )
    }

    /// Get the retry backoff base delay
    pub fn retry_base_or_default(&self) -> Duration {
        Duration::from_secs(
            self.forwarding
                .as_ref()
                .and_then(|f| f.retry_base_secs)
                .unwrap_or(DEFAULT_RETRY_BASE_SECS),
        )
    }

    /// Get the maximum delivery attempts per event
    pub fn retry_max_attempts_or_default(&self) -> u32 {
        self.forwarding
            .as_ref()
            .and_then(|f| f.retry_max_attempts)
            .unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS)
    }

    /// Get the pending-retry sweep period
    pub fn sweep_interval_or_default(&self) -> Duration {
        Duration::from_secs(
            self.forwarding
                .as_ref()
                .and_then(|f| f.sweep_interval_secs)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        )
    }

    /// Get the recording base URL, if configured
    pub fn recording_base_url(&self) -> Option<&str> {
        self.recordings.as_ref().and_then(|r| r.base_url.as_deref())
    }

    /// Get the same-day recording extension
    pub fn live_extension_or_default(&self) -> &str {
        self.recordings
            .as_ref()
            .and_then(|r| r.live_extension.as_deref())
            .unwrap_or(DEFAULT_LIVE_EXTENSION)
    }

    /// Get the archived recording extension
    pub fn archive_extension_or_default(&self) -> &str {
        self.recordings
            .as_ref()
            .and_then(|r| r.archive_extension.as_deref())
            .unwrap_or(DEFAULT_ARCHIVE_EXTENSION)
    }

    /// Get the recording download timeout
    pub fn download_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.recordings
                .as_ref()
                .and_then(|r| r.download_timeout_secs)
                .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        )
    }

    /// Get the transcript language tag
    pub fn language_or_default(&self) -> &str {
        self.transcription
            .as_ref()
            .and_then(|t| t.language.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Get the tenants file path, if configured
    pub fn tenants_file(&self) -> Option<&str> {
        self.transcription
            .as_ref()
            .and_then(|t| t.tenants_file.as_deref())
    }

    /// Get the proxy upstream allow-list; empty means the proxy is disabled
    pub fn proxy_allowed_hosts_or_default(&self) -> Vec<String> {
        self.proxy
            .as_ref()
            .and_then(|p| p.allowed_hosts.clone())
            .unwrap_or_default()
    }

    /// Get the audio proxy timeout
    pub fn proxy_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.proxy
                .as_ref()
                .and_then(|p| p.timeout_secs)
                .unwrap_or(DEFAULT_PROXY_TIMEOUT_SECS),
        )
    }
}

/// Merge optional config sections, other takes precedence field by field
fn merge_section<T>(base: Option<T>, other: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, other) {
        (None, None) => None,
        (Some(b), None) => Some(b),
        (None, Some(o)) => Some(o),
        (Some(b), Some(o)) => Some(merge(b, o)),
    }
}
