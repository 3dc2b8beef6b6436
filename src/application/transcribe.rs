//! Transcription orchestrator use case

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::audio::{locate_now, AudioData, RecordingLayout};
use crate::domain::credentials::ProviderKind;

use super::ports::{
    AudioFetcher, CredentialError, CredentialStore, FetchError, ProviderError, SpeechProvider,
};

/// Smallest body accepted as real audio; anything below this is assumed
/// to be an error page served with a 200
const MIN_AUDIO_BYTES: usize = 1024;

/// Where the audio for one request comes from
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Explicit URL, used verbatim
    Url(String),
    /// Recording code resolved through the locator heuristic
    Recording { code: String },
}

/// One transcription request
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub source: AudioSource,
    pub tenant_id: String,
    pub call_timestamp: Option<String>,
}

/// A finished transcription and how it was produced
#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
    pub elapsed_seconds: f64,
    pub language: String,
}

/// Errors from the transcription orchestrator
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("All audio candidates failed: {0}")]
    DownloadExhausted(String),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Provider(ProviderError),
}

impl TranscribeError {
    /// Taxonomy code surfaced in HTTP error responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::DownloadExhausted(_) => "download-exhausted",
            Self::Credentials(CredentialError::TenantNotFound(_)) => "tenant-not-found",
            Self::Credentials(CredentialError::NoCredentials(_)) => "no-credentials",
            Self::Credentials(CredentialError::Load(_)) => "credentials-load",
            Self::Provider(error) => error.code(),
        }
    }
}

/// Orchestrates audio download and provider fallback for one request.
///
/// Credential order from the resolver is authoritative; the orchestrator
/// never reorders based on runtime signals. A failure on one credential
/// is classified, logged and skipped; the last credential's failure is
/// the final error.
pub struct TranscribeUseCase {
    fetcher: Arc<dyn AudioFetcher>,
    credentials: Arc<dyn CredentialStore>,
    providers: HashMap<ProviderKind, Arc<dyn SpeechProvider>>,
    layout: RecordingLayout,
    language: String,
}

impl TranscribeUseCase {
    pub fn new(
        fetcher: Arc<dyn AudioFetcher>,
        credentials: Arc<dyn CredentialStore>,
        providers: HashMap<ProviderKind, Arc<dyn SpeechProvider>>,
        layout: RecordingLayout,
        language: String,
    ) -> Self {
        Self {
            fetcher,
            credentials,
            providers,
            layout,
            language,
        }
    }

    /// Execute one transcription request.
    pub async fn execute(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionOutcome, TranscribeError> {
        let candidates = match &request.source {
            AudioSource::Url(url) => vec![url.clone()],
            AudioSource::Recording { code } => {
                locate_now(request.call_timestamp.as_deref(), code, &self.layout).urls
            }
        };

        let (audio, source_url) = self.download(&candidates).await?;

        let credentials = self.credentials.resolve(&request.tenant_id).await?;

        let started = Instant::now();
        let total = credentials.len();
        let mut final_error = ProviderError::Transcribe("no providers attempted".to_string());
        for (index, credential) in credentials.iter().enumerate() {
            let Some(provider) = self.providers.get(&credential.provider) else {
                warn!(provider = %credential.provider, "no adapter registered, skipping credential");
                final_error = ProviderError::Transcribe(format!(
                    "no adapter registered for provider {}",
                    credential.provider
                ));
                continue;
            };
            info!(
                provider = %credential.provider,
                credential = index + 1,
                total,
                "trying provider"
            );
            match provider
                .transcribe(&audio, &credential.token, &source_url)
                .await
            {
                Ok(transcript) => {
                    let elapsed_seconds = started.elapsed().as_secs_f64();
                    info!(
                        provider = %credential.provider,
                        model = %transcript.model,
                        elapsed_seconds,
                        "transcription succeeded"
                    );
                    return Ok(TranscriptionOutcome {
                        text: transcript.text,
                        provider: credential.provider,
                        model: transcript.model,
                        elapsed_seconds,
                        language: self.language.clone(),
                    });
                }
                Err(error) => {
                    warn!(
                        provider = %credential.provider,
                        %error,
                        "provider failed, trying next credential"
                    );
                    final_error = error;
                }
            }
        }
        Err(TranscribeError::Provider(final_error))
    }

    /// Probe candidates in order; the first success with a plausible
    /// byte count wins.
    async fn download(
        &self,
        candidates: &[String],
    ) -> Result<(AudioData, String), TranscribeError> {
        let mut last_error: Option<FetchError> = None;
        for url in candidates {
            match self.fetcher.fetch(url).await {
                Ok(audio) if audio.size_bytes() >= MIN_AUDIO_BYTES => {
                    info!(url, size = %audio.human_readable_size(), "audio downloaded");
                    return Ok((audio, url.clone()));
                }
                Ok(audio) => {
                    warn!(url, bytes = audio.size_bytes(), "body too small to be audio");
                    last_error = Some(FetchError::TooSmall(audio.size_bytes()));
                }
                Err(error) => {
                    warn!(url, %error, "candidate download failed");
                    last_error = Some(error);
                }
            }
        }
        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no candidate URLs".to_string());
        Err(TranscribeError::DownloadExhausted(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Transcript;
    use crate::domain::audio::AudioMimeType;
    use crate::domain::credentials::ProviderCredential;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fetcher scripted per URL suffix
    struct ScriptedFetcher {
        requests: Mutex<Vec<String>>,
        outcomes: Vec<(String, Result<usize, FetchError>)>,
    }

    impl ScriptedFetcher {
        fn new(outcomes: Vec<(&str, Result<usize, FetchError>)>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                outcomes: outcomes
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            })
        }

        fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AudioFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<AudioData, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            let outcome = self
                .outcomes
                .iter()
                .find(|(suffix, _)| url.ends_with(suffix.as_str()))
                .map(|(_, outcome)| outcome);
            match outcome {
                Some(Ok(bytes)) => Ok(AudioData::new(vec![0u8; *bytes], AudioMimeType::Wav)),
                Some(Err(error)) => Err(error.clone()),
                None => Err(FetchError::Http(404)),
            }
        }
    }

    struct FixedCredentials {
        result: Result<Vec<ProviderCredential>, CredentialError>,
    }

    #[async_trait]
    impl CredentialStore for FixedCredentials {
        async fn resolve(
            &self,
            _tenant_id: &str,
        ) -> Result<Vec<ProviderCredential>, CredentialError> {
            self.result.clone()
        }
    }

    /// Provider scripted to fail or echo, recording invocation order
    struct ScriptedProvider {
        kind: ProviderKind,
        failure: Option<ProviderError>,
        calls: Arc<Mutex<Vec<ProviderKind>>>,
    }

    #[async_trait]
    impl SpeechProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn transcribe(
            &self,
            _audio: &AudioData,
            _token: &str,
            _source_url: &str,
        ) -> Result<Transcript, ProviderError> {
            self.calls.lock().unwrap().push(self.kind);
            match &self.failure {
                Some(error) => Err(error.clone()),
                None => Ok(Transcript {
                    text: "olá, bom dia".to_string(),
                    model: "test-model-1".to_string(),
                }),
            }
        }
    }

    fn layout() -> RecordingLayout {
        RecordingLayout {
            base_url: "http://pbx/monitor".to_string(),
            live_extension: "wav".to_string(),
            archive_extension: "mp3".to_string(),
        }
    }

    fn credential(provider: ProviderKind, token: &str) -> ProviderCredential {
        ProviderCredential {
            provider,
            token: token.to_string(),
            preferred: false,
        }
    }

    fn use_case(
        fetcher: Arc<ScriptedFetcher>,
        credentials: Result<Vec<ProviderCredential>, CredentialError>,
        providers: Vec<(ProviderKind, Option<ProviderError>)>,
    ) -> (TranscribeUseCase, Arc<Mutex<Vec<ProviderKind>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry: HashMap<ProviderKind, Arc<dyn SpeechProvider>> = providers
            .into_iter()
            .map(|(kind, failure)| {
                let provider: Arc<dyn SpeechProvider> = Arc::new(ScriptedProvider {
                    kind,
                    failure,
                    calls: Arc::clone(&calls),
                });
                (kind, provider)
            })
            .collect();
        let use_case = TranscribeUseCase::new(
            fetcher,
            Arc::new(FixedCredentials {
                result: credentials,
            }),
            registry,
            layout(),
            "pt-BR".to_string(),
        );
        (use_case, calls)
    }

    fn recording_request(code: &str, timestamp: Option<&str>) -> TranscriptionRequest {
        TranscriptionRequest {
            source: AudioSource::Recording {
                code: code.to_string(),
            },
            tenant_id: "acme".to_string(),
            call_timestamp: timestamp.map(String::from),
        }
    }

    #[tokio::test]
    async fn explicit_url_wins_over_the_locator() {
        let fetcher = ScriptedFetcher::new(vec![("custom.ogg", Ok(4096))]);
        let (use_case, _) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![credential(ProviderKind::Gemini, "AIzaSy")]),
            vec![(ProviderKind::Gemini, None)],
        );

        let outcome = use_case
            .execute(TranscriptionRequest {
                source: AudioSource::Url("http://elsewhere/custom.ogg".to_string()),
                tenant_id: "acme".to_string(),
                call_timestamp: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.text, "olá, bom dia");
        assert_eq!(fetcher.requested(), vec!["http://elsewhere/custom.ogg"]);
    }

    #[tokio::test]
    async fn falls_back_to_archive_candidate() {
        let fetcher = ScriptedFetcher::new(vec![
            (".wav", Err(FetchError::Http(404))),
            (".mp3", Ok(4096)),
        ]);
        let (use_case, _) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![credential(ProviderKind::Gemini, "AIzaSy")]),
            vec![(ProviderKind::Gemini, None)],
        );

        // An old call, so both candidates are probed
        let outcome = use_case
            .execute(recording_request("ABC123", Some("2020-01-01 09:00:00")))
            .await
            .unwrap();

        assert_eq!(outcome.provider, ProviderKind::Gemini);
        assert_eq!(
            fetcher.requested(),
            vec![
                "http://pbx/monitor/ABC123.wav",
                "http://pbx/monitor/ABC123.mp3"
            ]
        );
    }

    #[tokio::test]
    async fn tiny_body_is_not_audio() {
        let fetcher = ScriptedFetcher::new(vec![
            (".wav", Ok(64)),
            (".mp3", Err(FetchError::Http(404))),
        ]);
        let (use_case, calls) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![credential(ProviderKind::Gemini, "AIzaSy")]),
            vec![(ProviderKind::Gemini, None)],
        );

        let result = use_case
            .execute(recording_request("ABC123", Some("2020-01-01 09:00:00")))
            .await;

        match result {
            Err(TranscribeError::DownloadExhausted(detail)) => {
                assert!(detail.contains("404"), "unexpected detail: {detail}");
            }
            other => panic!("expected DownloadExhausted, got {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_exhausted_preserves_last_error() {
        let fetcher = ScriptedFetcher::new(vec![
            (".wav", Err(FetchError::Http(404))),
            (
                ".mp3",
                Err(FetchError::Transport("connection reset".to_string())),
            ),
        ]);
        let (use_case, _) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![credential(ProviderKind::Gemini, "AIzaSy")]),
            vec![(ProviderKind::Gemini, None)],
        );

        let result = use_case
            .execute(recording_request("ABC123", Some("2020-01-01 09:00:00")))
            .await;

        match result {
            Err(TranscribeError::DownloadExhausted(detail)) => {
                assert!(detail.contains("connection reset"));
            }
            other => panic!("expected DownloadExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_token_falls_through_to_next_credential() {
        let fetcher = ScriptedFetcher::new(vec![(".wav", Ok(4096))]);
        let (use_case, calls) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![
                credential(ProviderKind::Gemini, "expired"),
                credential(ProviderKind::OpenAi, "sk-proj-good"),
            ]),
            vec![
                (ProviderKind::Gemini, Some(ProviderError::InvalidToken)),
                (ProviderKind::OpenAi, None),
            ],
        );

        let outcome = use_case
            .execute(recording_request("ABC123", None))
            .await
            .unwrap();

        assert_eq!(outcome.provider, ProviderKind::OpenAi);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![ProviderKind::Gemini, ProviderKind::OpenAi]
        );
    }

    #[tokio::test]
    async fn last_credential_failure_escalates() {
        let fetcher = ScriptedFetcher::new(vec![(".wav", Ok(4096))]);
        let (use_case, _) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![
                credential(ProviderKind::Gemini, "expired"),
                credential(ProviderKind::OpenAi, "sk-proj-bad"),
            ]),
            vec![
                (ProviderKind::Gemini, Some(ProviderError::InvalidToken)),
                (
                    ProviderKind::OpenAi,
                    Some(ProviderError::Transcribe("upstream 500".to_string())),
                ),
            ],
        );

        let result = use_case.execute(recording_request("ABC123", None)).await;
        match result {
            Err(TranscribeError::Provider(ProviderError::Transcribe(msg))) => {
                assert_eq!(msg, "upstream 500");
            }
            other => panic!("expected the last classified failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn credential_errors_propagate_unchanged() {
        let fetcher = ScriptedFetcher::new(vec![(".wav", Ok(4096))]);
        let (use_case, _) = use_case(
            Arc::clone(&fetcher),
            Err(CredentialError::TenantNotFound("ghost".to_string())),
            vec![(ProviderKind::Gemini, None)],
        );

        let result = use_case.execute(recording_request("ABC123", None)).await;
        assert!(matches!(
            result,
            Err(TranscribeError::Credentials(
                CredentialError::TenantNotFound(_)
            ))
        ));
    }

    #[tokio::test]
    async fn missing_adapter_skips_to_next_credential() {
        let fetcher = ScriptedFetcher::new(vec![(".wav", Ok(4096))]);
        // Only a Gemini adapter is registered
        let (use_case, calls) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![
                credential(ProviderKind::OpenAi, "sk-proj-abc"),
                credential(ProviderKind::Gemini, "AIzaSy"),
            ]),
            vec![(ProviderKind::Gemini, None)],
        );

        let outcome = use_case
            .execute(recording_request("ABC123", None))
            .await
            .unwrap();

        assert_eq!(outcome.provider, ProviderKind::Gemini);
        assert_eq!(*calls.lock().unwrap(), vec![ProviderKind::Gemini]);
    }

    #[tokio::test]
    async fn outcome_reports_language_model_and_elapsed() {
        let fetcher = ScriptedFetcher::new(vec![(".wav", Ok(4096))]);
        let (use_case, _) = use_case(
            Arc::clone(&fetcher),
            Ok(vec![credential(ProviderKind::Gemini, "AIzaSy")]),
            vec![(ProviderKind::Gemini, None)],
        );

        let outcome = use_case
            .execute(recording_request("ABC123", None))
            .await
            .unwrap();

        assert_eq!(outcome.language, "pt-BR");
        assert_eq!(outcome.model, "test-model-1");
        assert!(outcome.elapsed_seconds >= 0.0);
        assert!(outcome.elapsed_seconds < 5.0);
    }

    #[test]
    fn taxonomy_codes_cover_every_branch() {
        assert_eq!(
            TranscribeError::DownloadExhausted(String::new()).code(),
            "download-exhausted"
        );
        assert_eq!(
            TranscribeError::Credentials(CredentialError::TenantNotFound("x".into())).code(),
            "tenant-not-found"
        );
        assert_eq!(
            TranscribeError::Credentials(CredentialError::NoCredentials("x".into())).code(),
            "no-credentials"
        );
        assert_eq!(
            TranscribeError::Provider(ProviderError::InvalidToken).code(),
            "invalid-token"
        );
    }
}
