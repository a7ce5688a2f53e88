//! Demo root endpoint.

use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::state::AppState;

/// Registers the root route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(hello))
}

/// Returns a fixed greeting, giving the middleware something to measure.
async fn hello() -> impl IntoResponse {
    Json("Hello world!")
}
