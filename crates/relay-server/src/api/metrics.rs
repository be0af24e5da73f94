//! Metrics API - /metrics
//!
//! GET /metrics - Prometheus text exposition of the orchestrator counters

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use relay_core::metrics::PROMETHEUS_CONTENT_TYPE;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(metrics))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}
