use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::audit::{AuditCounts, AuditEntry};
use crate::http::state::AppState;

const DEFAULT_AUDIT_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct AuditResponse {
    pub total: usize,
    pub returned: usize,
    pub events: Vec<AuditEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub last_hour: AuditCounts,
    pub pending_retries: usize,
    pub rate_table_size: usize,
}

pub async fn audit_handler(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);
    let (total, events) = {
        let audit = state.audit.lock().unwrap();
        (audit.len(), audit.recent(limit))
    };
    Json(AuditResponse {
        total,
        returned: events.len(),
        events,
    })
}

pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cutoff = Utc::now() - Duration::hours(1);
    let last_hour = state.audit.lock().unwrap().counts_since(cutoff);
    let pending_retries = state.relay.pending_len();
    let rate_table_size = state.rate_limiter.lock().unwrap().tracked_addresses();
    Json(StatsResponse {
        last_hour,
        pending_retries,
        rate_table_size,
    })
}
