use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;

use crate::application::AdmissionError;
use crate::domain::call_event::IngressPayload;
use crate::http::request_id::RequestId;
use crate::http::state::AppState;

#[derive(Serialize)]
pub struct IngressAccepted {
    pub success: bool,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub received: ReceivedFields,
}

#[derive(Serialize)]
pub struct ReceivedFields {
    pub src: String,
    pub dst: String,
    pub userfield: String,
    pub callid: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Source address as the admission checks see it: the first
/// `x-forwarded-for` hop when present, the socket peer otherwise.
fn remote_address(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| {
            connect_info
                .map(|ci| ci.0.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        })
}

fn status_for(error: &AdmissionError) -> StatusCode {
    match error {
        AdmissionError::IpNotAllowed => StatusCode::FORBIDDEN,
        AdmissionError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AdmissionError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        AdmissionError::EmptyBody => StatusCode::BAD_REQUEST,
    }
}

#[tracing::instrument(skip(state, headers, body))]
pub async fn ingress_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let remote = remote_address(&headers, connect_info.as_ref());

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(false);

    let payload = if is_json {
        match serde_json::from_str(&body) {
            Ok(value) => IngressPayload::Json(value),
            Err(e) => {
                tracing::warn!(error = %e, "rejected: body is not valid JSON");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        success: false,
                        error: "Body is not valid JSON".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    } else {
        IngressPayload::FormEncoded(body)
    };

    match state.ingress.accept(&remote, payload, &request_id.0) {
        Ok(accepted) => (
            StatusCode::OK,
            Json(IngressAccepted {
                success: true,
                request_id: accepted.request_id,
                received: ReceivedFields {
                    src: accepted.src,
                    dst: accepted.dst,
                    userfield: accepted.userfield,
                    callid: accepted.callid,
                },
            }),
        )
            .into_response(),
        Err(error) => (
            status_for(&error),
            Json(ErrorResponse {
                success: false,
                error: error.to_string(),
            }),
        )
            .into_response(),
    }
}
