//! Shared application state.

use std::sync::Arc;

use crate::config::ConfigV1;
use crate::metrics::Metrics;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request handler; holds the configuration loaded at
/// startup and the metric collectors the scrape endpoint renders.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Registered metric collectors, shared with the request middleware.
    pub metrics: Metrics,
}
