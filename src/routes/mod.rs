//! HTTP route definitions and handlers.
//!
//! This module organizes all HTTP endpoints: the demo root endpoint, the
//! metrics exposition endpoint and health checks.

mod health_routes;
mod hello_routes;
mod metrics_routes;

use axum::Router;

use crate::state::AppState;

/// Creates the application router with all configured routes.
///
/// Combines all route modules into a single router and attaches the
/// application state for access in handlers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(hello_routes::routes())
        .merge(metrics_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
