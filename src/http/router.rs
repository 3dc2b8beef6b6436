use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::http::handlers::{
    audio_proxy_handler, audit_handler, health_handler, ingress_handler, latest_event_handler,
    processed_event_handler, stats_handler, transcribe_handler,
};
use crate::http::request_id::request_id_middleware;
use crate::http::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/cdr", post(ingress_handler))
        .route("/cdr/latest", get(latest_event_handler))
        .route("/cdr/processed", post(processed_event_handler))
        .route("/audit", get(audit_handler))
        .route("/stats", get(stats_handler))
        .route("/transcribe", post(transcribe_handler))
        .route("/audio", get(audio_proxy_handler))
        .route("/healthz", get(health_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
