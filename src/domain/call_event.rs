//! Call completion event value objects

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error when an ingress payload cannot be normalized
#[derive(Debug, Clone, Error)]
pub enum PayloadError {
    #[error("JSON payload must be an object")]
    NotAnObject,
    #[error("Failed to encode payload: {0}")]
    Encode(String),
}

/// An inbound event body before normalization.
///
/// PBX firmwares send either URL-encoded form data or a JSON object for
/// the same notification; both shapes collapse to one canonical encoded
/// string before any business logic runs.
#[derive(Debug, Clone)]
pub enum IngressPayload {
    /// Body that arrived already URL-encoded
    FormEncoded(String),
    /// Body that arrived as structured JSON
    Json(serde_json::Value),
}

impl IngressPayload {
    /// Normalize to the canonical URL-encoded body string.
    ///
    /// Form input passes through trimmed. JSON objects are flattened to
    /// `key=value&...` pairs with scalar values stringified (null becomes
    /// empty) and nested values JSON-encoded.
    pub fn canonicalize(&self) -> Result<String, PayloadError> {
        match self {
            Self::FormEncoded(body) => Ok(body.trim().to_string()),
            Self::Json(value) => {
                let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
                let pairs: Vec<(String, String)> = object
                    .iter()
                    .map(|(key, value)| {
                        let text = match value {
                            serde_json::Value::Null => String::new(),
                            serde_json::Value::String(s) => s.clone(),
                            serde_json::Value::Number(n) => n.to_string(),
                            serde_json::Value::Bool(b) => b.to_string(),
                            nested => nested.to_string(),
                        };
                        (key.clone(), text)
                    })
                    .collect();
                serde_urlencoded::to_string(&pairs)
                    .map_err(|e| PayloadError::Encode(e.to_string()))
            }
        }
    }
}

/// A telephony call-completion notification.
///
/// Extracted best-effort from the canonical body for responses, logs and
/// audit details. Absent fields stay empty rather than failing ingress;
/// the canonical body itself is what gets forwarded downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallEvent {
    /// Originating extension
    pub src: String,
    /// Destination number, may contain formatting
    pub dst: String,
    /// Recording code, the natural dedup key downstream
    pub userfield: String,
    /// Call timestamp, normalized when parseable
    pub calldate: String,
    /// Total call length in seconds
    pub duration: u64,
    /// Billed seconds
    pub billsec: u64,
    /// Call outcome code (ANSWER, NO ANSWER, BUSY, ...)
    pub disposition: String,
    /// Free-text caller label
    pub callid: String,
    /// Tenant/billing identifier
    pub company_id: String,
    /// Decimal price string
    pub price: String,
}

impl CallEvent {
    /// Extract known fields from a canonical encoded body.
    ///
    /// Extraction never fails; unknown keys are ignored and absent fields
    /// keep their empty/zero defaults.
    pub fn from_encoded(body: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body).unwrap_or_default();
        let mut event = Self::default();
        for (key, value) in pairs {
            match key.to_lowercase().as_str() {
                "src" => event.src = value,
                "dst" => event.dst = value,
                "userfield" => event.userfield = value,
                "calldate" => event.calldate = normalize_calldate(&value),
                "duration" => event.duration = value.parse().unwrap_or(0),
                "billsec" => event.billsec = value.parse().unwrap_or(0),
                "disposition" => event.disposition = value,
                "callid" => event.callid = value,
                "companyid" | "accountcode" => {
                    if event.company_id.is_empty() {
                        event.company_id = value;
                    }
                }
                "price" => event.price = value,
                _ => {}
            }
        }
        event
    }

    /// One-line summary for logs and audit details
    pub fn summary(&self) -> String {
        format!(
            "{} -> {} [{}]",
            if self.src.is_empty() { "?" } else { &self.src },
            if self.dst.is_empty() { "?" } else { &self.dst },
            if self.userfield.is_empty() {
                "-"
            } else {
                &self.userfield
            },
        )
    }
}

/// Undo the URL-escaping PBX senders commonly leave in timestamps.
///
/// `+` stands in for the space and `%3A` for the colon when the value
/// passed through a query string before reaching us.
pub fn unescape_timestamp(raw: &str) -> String {
    raw.replace('+', " ").replace("%3A", ":").replace("%3a", ":")
}

/// Parse a call timestamp in either of the formats PBXes emit.
///
/// Tries ISO-like `2025-01-15 10:30:00` first, then the day-first
/// `15/01/2025 10:30:00` form.
pub fn parse_calldate(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = unescape_timestamp(raw.trim());
    NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&cleaned, "%d/%m/%Y %H:%M:%S"))
        .ok()
}

/// Normalize a call timestamp to `%Y-%m-%d %H:%M:%S` when parseable,
/// keeping the raw value verbatim otherwise.
pub fn normalize_calldate(raw: &str) -> String {
    match parse_calldate(raw) {
        Some(parsed) => parsed.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => raw.to_string(),
    }
}
