//! Speech provider port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioData;
use crate::domain::credentials::ProviderKind;

/// Longest error body excerpt carried in a classified failure
const EXCERPT_LEN: usize = 200;

/// A successful transcription and the model variant that produced it
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub model: String,
}

/// Provider failure taxonomy
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider rejected the credential")]
    InvalidToken,

    #[error("Audio format not supported: {0}")]
    FormatNotSupported(String),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Provider denied access: {0}")]
    AccessDenied(String),

    #[error("Transcription failed: {0}")]
    Transcribe(String),
}

impl ProviderError {
    /// Classify a provider failure from its HTTP status and body.
    ///
    /// Providers expose no stable structured error code, so this matches
    /// the literal strings they return today. Body patterns run before
    /// bare status codes: Gemini reports an invalid key as a 400, not a
    /// 401. Unrecognized failures fall through to the catch-all.
    pub fn classify(status: u16, body: &str) -> Self {
        if body.contains("API key not valid")
            || body.contains("API_KEY_INVALID")
            || body.contains("Incorrect API key provided")
        {
            return Self::InvalidToken;
        }
        if status == 401 {
            return Self::InvalidToken;
        }
        if body.contains("RESOURCE_EXHAUSTED")
            || body.contains("insufficient_quota")
            || body.contains("exceeded your current quota")
        {
            return Self::RateLimited;
        }
        if status == 429 {
            return Self::RateLimited;
        }
        if body.contains("Invalid file format") || body.contains("Unsupported file format") {
            return Self::FormatNotSupported(excerpt(body));
        }
        if body.contains("PERMISSION_DENIED") || status == 403 {
            return Self::AccessDenied(excerpt(body));
        }
        Self::Transcribe(excerpt(body))
    }

    /// Taxonomy code surfaced in HTTP error responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid-token",
            Self::FormatNotSupported(_) => "format-not-supported",
            Self::RateLimited => "rate-limited",
            Self::AccessDenied(_) => "access-denied",
            Self::Transcribe(_) => "transcribe-error",
        }
    }
}

/// Shorten an error body for diagnostics without dumping whole pages
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= EXCERPT_LEN {
        return trimmed.to_string();
    }
    let mut end = EXCERPT_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

/// Port for one speech-to-text vendor
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Which vendor this adapter fronts
    fn kind(&self) -> ProviderKind;

    /// Transcribe audio with one credential.
    ///
    /// # Arguments
    /// * `audio` - Downloaded audio with its MIME hint
    /// * `token` - The tenant credential to authenticate with
    /// * `source_url` - Where the audio came from, for vendors that
    ///   prefer fetching by reference
    ///
    /// # Returns
    /// The transcript and whichever model variant produced it
    async fn transcribe(
        &self,
        audio: &AudioData,
        token: &str,
        source_url: &str,
    ) -> Result<Transcript, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_invalid_key_is_a_400_with_body_pattern() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            ProviderError::classify(400, body),
            ProviderError::InvalidToken
        ));
    }

    #[test]
    fn openai_incorrect_key_classifies_as_invalid_token() {
        let body = r#"{"error":{"message":"Incorrect API key provided: sk-proj-***. You can find your API key at https://platform.openai.com.","type":"invalid_request_error"}}"#;
        assert!(matches!(
            ProviderError::classify(401, body),
            ProviderError::InvalidToken
        ));
    }

    #[test]
    fn bare_401_classifies_as_invalid_token() {
        assert!(matches!(
            ProviderError::classify(401, ""),
            ProviderError::InvalidToken
        ));
    }

    #[test]
    fn quota_strings_classify_as_rate_limited() {
        assert!(matches!(
            ProviderError::classify(429, r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            ProviderError::classify(
                429,
                r#"{"error":{"type":"insufficient_quota","message":"You exceeded your current quota, please check your plan and billing details."}}"#
            ),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            ProviderError::classify(429, ""),
            ProviderError::RateLimited
        ));
    }

    #[test]
    fn format_rejection_classifies_as_format_not_supported() {
        let body = r#"{"error":{"message":"Invalid file format. Supported formats: ['flac', 'm4a', 'mp3', 'mp4', 'mpeg', 'mpga', 'oga', 'ogg', 'wav', 'webm']"}}"#;
        assert!(matches!(
            ProviderError::classify(400, body),
            ProviderError::FormatNotSupported(_)
        ));
    }

    #[test]
    fn permission_denied_classifies_as_access_denied() {
        assert!(matches!(
            ProviderError::classify(403, r#"{"error":{"status":"PERMISSION_DENIED"}}"#),
            ProviderError::AccessDenied(_)
        ));
        assert!(matches!(
            ProviderError::classify(403, "forbidden"),
            ProviderError::AccessDenied(_)
        ));
    }

    #[test]
    fn unknown_failures_fall_through_to_catch_all() {
        assert!(matches!(
            ProviderError::classify(500, "Internal Server Error"),
            ProviderError::Transcribe(_)
        ));
    }

    #[test]
    fn excerpt_bounds_long_bodies() {
        let long = "x".repeat(5000);
        match ProviderError::classify(500, &long) {
            ProviderError::Transcribe(msg) => assert!(msg.len() <= EXCERPT_LEN + 3),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn taxonomy_codes_are_stable() {
        assert_eq!(ProviderError::InvalidToken.code(), "invalid-token");
        assert_eq!(ProviderError::RateLimited.code(), "rate-limited");
        assert_eq!(
            ProviderError::Transcribe(String::new()).code(),
            "transcribe-error"
        );
    }
}
