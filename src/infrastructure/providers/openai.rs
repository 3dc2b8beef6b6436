//! OpenAI speech provider adapter

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::application::ports::{ProviderError, SpeechProvider, Transcript};
use crate::domain::audio::AudioData;
use crate::domain::credentials::ProviderKind;

/// Model variants tried in order for one credential
const MODEL_VARIANTS: [&str; 2] = ["gpt-4o-mini-transcribe", "whisper-1"];

/// OpenAI API base URL
const API_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI adapter: multipart upload to the audio transcriptions endpoint.
pub struct OpenAiTranscriber {
    base_url: String,
    language: String,
    client: reqwest::Client,
}

impl OpenAiTranscriber {
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

    fn api_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        )
    }

    /// The transcriptions endpoint expects a bare ISO-639-1 code, not a
    /// full locale tag.
    fn language_code(&self) -> &str {
        self.language.split('-').next().unwrap_or(&self.language)
    }

    /// File name sent with the upload; the API sniffs the container
    /// format from the extension.
    fn upload_file_name(audio: &AudioData) -> String {
        let extension = match audio.mime_type().as_str() {
            "audio/wav" => "wav",
            "audio/ogg" => "ogg",
            "audio/webm" => "webm",
            "audio/mp4" => "mp4",
            _ => "mp3",
        };
        format!("audio.{extension}")
    }

    async fn transcribe_with_model(
        &self,
        model: &str,
        audio: &AudioData,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let part = reqwest::multipart::Part::bytes(audio.data().to_vec())
            .file_name(Self::upload_file_name(audio))
            .mime_str(audio.mime_type().as_str())
            .map_err(|e| ProviderError::Transcribe(format!("invalid upload part: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", model.to_string())
            .text("language", self.language_code().to_string());

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Transcribe(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::classify(status.as_u16(), &error_text));
        }

        let response: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transcribe(format!("unreadable response: {e}")))?;

        let trimmed = response.text.trim();
        if trimmed.is_empty() {
            return Err(ProviderError::Transcribe("empty response".to_string()));
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl SpeechProvider for OpenAiTranscriber {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioMimeType;

    #[test]
    fn api_url_targets_transcriptions() {
        let transcriber = OpenAiTranscriber::new("pt-BR");
        assert_eq!(
            transcriber.api_url(),
            "https://api.openai.com/v1/audio/transcriptions"
        );
    }

    #[test]
    fn custom_base_url_is_used() {
        let transcriber = OpenAiTranscriber::with_base_url("pt-BR", "http://127.0.0.1:9999/v1/");
        assert_eq!(
            transcriber.api_url(),
            "http://127.0.0.1:9999/v1/audio/transcriptions"
        );
    }

    #[test]
    fn language_tag_reduces_to_primary_subtag() {
        assert_eq!(OpenAiTranscriber::new("pt-BR").language_code(), "pt");
        assert_eq!(OpenAiTranscriber::new("en").language_code(), "en");
    }

    #[test]
    fn upload_name_follows_the_mime_hint() {
        let wav = AudioData::new(vec![0], AudioMimeType::Wav);
        assert_eq!(OpenAiTranscriber::upload_file_name(&wav), "audio.wav");
        let mp3 = AudioData::new(vec![0], AudioMimeType::Mp3);
        assert_eq!(OpenAiTranscriber::upload_file_name(&mp3), "audio.mp3");
    }

    #[test]
    fn mini_variant_is_tried_first() {
        assert_eq!(MODEL_VARIANTS[0], "gpt-4o-mini-transcribe");
        assert_eq!(MODEL_VARIANTS[1], "whisper-1");
    }
}
