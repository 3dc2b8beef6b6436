use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Fetch audio from an allow-listed upstream on behalf of a browser
/// that cannot reach the recording server directly. The body is
/// buffered and passed through with the upstream status and content
/// type; CORS comes from the router-wide permissive layer.
#[tracing::instrument(skip(state))]
pub async fn audio_proxy_handler(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> impl IntoResponse {
    let url = match reqwest::Url::parse(&query.url) {
        Ok(url) => url,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid url parameter"),
    };

    let allowed = url
        .host_str()
        .map(|host| state.proxy_allowed_hosts.contains(&host.to_ascii_lowercase()))
        .unwrap_or(false);
    if !allowed {
        tracing::warn!(url = %url, "proxy refused: host not allowed");
        return error_response(StatusCode::FORBIDDEN, "Upstream host not allowed");
    }

    let upstream = match state.proxy_client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "proxy upstream unreachable");
            return error_response(StatusCode::BAD_GATEWAY, "Upstream request failed");
        }
    };

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE.as_str())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let body = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "proxy body read failed");
            return error_response(StatusCode::BAD_GATEWAY, "Upstream body read failed");
        }
    };

    tracing::debug!(url = %url, status = %status, bytes = body.len(), "proxied audio");
    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}
