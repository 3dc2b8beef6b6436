//! Gemini speech provider adapter

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::ports::{ProviderError, SpeechProvider, Transcript};
use crate::domain::audio::AudioData;
use crate::domain::credentials::ProviderKind;

/// Model variants tried in order for one credential
const MODEL_VARIANTS: [&str; 2] = ["gemini-2.0-flash-lite", "gemini-2.0-flash"];

/// Gemini API base URL
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// Request types for Gemini API

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Option<SystemInstruction>,
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i32,
}

// Response types for Gemini API

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    code: Option<i32>,
}

/// Gemini adapter: generateContent with the audio inlined as base64.
pub struct GeminiTranscriber {
    base_url: String,
    language: String,
    client: reqwest::Client,
}

impl GeminiTranscriber {
    /// Create an adapter targeting the public API
    pub fn new(language: impl Into<String>) -> Self {
        Self::with_base_url(language, API_BASE_URL)
    }

    /// Create an adapter targeting a custom base URL
    pub fn with_base_url(language: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            language: language.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the API URL for one model variant
    fn api_url(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            api_key
        )
    }

    /// Build the request body
    fn build_request(&self, audio: &AudioData) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: audio.mime_type().to_string(),
                        data: audio.to_base64(),
                    }),
                }],
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![TextPart {
                    text: format!(
                        "Transcribe this call recording verbatim. The audio language is {}. \
                         Return only the transcribed text, with no commentary.",
                        self.language
                    ),
                }],
            }),
            generation_config: Some(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: 0, // Disable thinking for faster response
                }),
            }),
        }
    }

    /// Extract text from response
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let parts: Vec<&str> = response
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }

    async fn transcribe_with_model(
        &self,
        model: &str,
        audio: &AudioData,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let url = self.api_url(model, api_key);
        let body = self.build_request(audio);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transcribe(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::classify(status.as_u16(), &error_text));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transcribe(format!("unreadable response: {e}")))?;

        // API errors can arrive inside a 200 body
        if let Some(error) = response.error {
            let code = error.code.and_then(|c| u16::try_from(c).ok()).unwrap_or(0);
            return Err(ProviderError::classify(code, &error.message));
        }

        let text = Self::extract_text(&response)
            .ok_or_else(|| ProviderError::Transcribe("empty response".to_string()))?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::Transcribe("empty response".to_string()));
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl SpeechProvider for GeminiTranscriber {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    /// Try each model variant in order. An invalid token short-circuits:
    /// the same credential cannot recover on another variant.
    async fn transcribe(
        &self,
        audio: &AudioData,
        token: &str,
        _source_url: &str,
    ) -> Result<Transcript, ProviderError> {
        let mut last_error = ProviderError::Transcribe("no model variants".to_string());
        for model in MODEL_VARIANTS {
            match self.transcribe_with_model(model, audio, token).await {
                Ok(text) => {
                    return Ok(Transcript {
                        text,
                        model: model.to_string(),
                    })
                }
                Err(ProviderError::InvalidToken) => return Err(ProviderError::InvalidToken),
                Err(error) => {
                    warn!(model, %error, "model variant failed");
                    last_error = error;
                }
            }
        }
        Err(last_error)
    }
}
