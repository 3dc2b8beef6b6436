use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::ports::CredentialError;
use crate::application::{AudioSource, TranscribeError, TranscriptionRequest};
use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeBody {
    pub audio_url: Option<String>,
    pub recording_code: Option<String>,
    pub tenant_id: Option<String>,
    pub call_timestamp: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeResponse {
    pub success: bool,
    pub transcription: String,
    pub provider_used: String,
    pub model_used: String,
    pub elapsed_seconds: f64,
    pub language: String,
}

#[derive(Serialize)]
pub struct TranscribeErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

fn bad_request(message: &str) -> (StatusCode, Json<TranscribeErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(TranscribeErrorResponse {
            success: false,
            error: message.to_string(),
            code: "bad-request".to_string(),
        }),
    )
}

fn status_for(error: &TranscribeError) -> StatusCode {
    match error {
        TranscribeError::Credentials(CredentialError::TenantNotFound(_)) => StatusCode::NOT_FOUND,
        TranscribeError::Credentials(CredentialError::NoCredentials(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TranscribeError::Credentials(CredentialError::Load(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TranscribeError::DownloadExhausted(_) => StatusCode::BAD_GATEWAY,
        TranscribeError::Provider(_) => StatusCode::BAD_GATEWAY,
    }
}

#[tracing::instrument(skip(state))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    Json(body): Json<TranscribeBody>,
) -> impl IntoResponse {
    let tenant_id = match body.tenant_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return bad_request("tenantId is required").into_response(),
    };

    let source = match (&body.audio_url, &body.recording_code) {
        (Some(url), _) if !url.trim().is_empty() => AudioSource::Url(url.trim().to_string()),
        (_, Some(code)) if !code.trim().is_empty() => {
            if !state.recordings_configured {
                return bad_request("No recording base URL configured").into_response();
            }
            AudioSource::Recording {
                code: code.trim().to_string(),
            }
        }
        _ => return bad_request("Either audioUrl or recordingCode is required").into_response(),
    };

    let request = TranscriptionRequest {
        source,
        tenant_id,
        call_timestamp: body.call_timestamp,
    };

    match state.transcribe.execute(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(TranscribeResponse {
                success: true,
                transcription: outcome.text,
                provider_used: outcome.provider.as_str().to_string(),
                model_used: outcome.model,
                elapsed_seconds: outcome.elapsed_seconds,
                language: outcome.language,
            }),
        )
            .into_response(),
        Err(error) => {
            tracing::warn!(code = error.code(), %error, "transcription failed");
            (
                status_for(&error),
                Json(TranscribeErrorResponse {
                    success: false,
                    error: error.to_string(),
                    code: error.code().to_string(),
                }),
            )
                .into_response()
        }
    }
}
