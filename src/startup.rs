//! Application startup and server initialization.
//!
//! This module handles the creation and configuration of the HTTP server,
//! including metric registration, middleware attachment and route setup.

use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::metrics::{track_requests, Metrics};
use crate::routes;
use crate::state::AppState;

/// Initializes and runs the application server.
///
/// Registers the metric collectors described by the configuration, attaches
/// the request-tracking middleware to the router and starts serving. Binds
/// to the address specified in the configuration.
///
/// # Errors
///
/// Returns an error if metric registration fails (the process must not serve
/// with an inconsistent metric set) or if the server cannot bind to the
/// specified address.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Metrics::new(&config.metrics)?;

    info!("Starting server on {}", config.bind_address);

    let state = AppState {
        config: config.clone(),
        metrics: metrics.clone(),
    };

    let app = routes::create_router(state).layer(middleware::from_fn_with_state(
        metrics,
        track_requests::<Metrics>,
    ));

    let listener = TcpListener::bind(&config.bind_address).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
