use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::http::state::AppState;

/// Latest event for UI polling: the enriched slot when the external
/// normalizer has pushed one, the raw slot otherwise. Both empty is a
/// 200 with `success: false`, not an error.
pub async fn latest_event_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (processed, raw) = {
        let latest = state.latest.lock().unwrap();
        (
            latest.latest_processed().cloned(),
            latest.latest_raw().cloned(),
        )
    };

    if let Some(processed) = processed {
        return Json(json!({
            "success": true,
            "source": "processed",
            "event": processed.payload,
            "storedAt": processed.stored_at,
        }));
    }

    if let Some(raw) = raw {
        return Json(json!({
            "success": true,
            "source": "raw",
            "event": raw.event,
            "body": raw.body,
            "receivedAt": raw.received_at,
        }));
    }

    Json(json!({ "success": false }))
}

/// The external normalizer pushes its enriched rendition of the latest
/// event here; it replaces the processed slot wholesale.
pub async fn processed_event_handler(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    state.latest.lock().unwrap().store_processed(payload);
    tracing::info!("processed event stored");
    (StatusCode::OK, Json(json!({ "success": true })))
}
