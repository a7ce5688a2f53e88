//! Metrics exposition endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use http::header::CONTENT_TYPE;
use tracing::error;

use crate::state::AppState;

/// Content type of the Prometheus text exposition format.
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Creates the metrics route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Handler for the /metrics endpoint.
///
/// Returns all collected metrics in Prometheus text format. A rendering
/// failure surfaces as a 500 from this endpoint only; request traffic is
/// unaffected.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(text) => {
            (StatusCode::OK, [(CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], text).into_response()
        }
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics").into_response()
        }
    }
}
