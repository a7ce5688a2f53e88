//! Metrics collection and exposition for Prometheus.
//!
//! This module provides the registered collector set ([`Metrics`]), the
//! request-tracking middleware ([`track_requests`]) and the definition types
//! for caller-supplied metrics.

mod cardinality;
mod definition;
mod error;
mod middleware;
mod recorder;
mod summary;

pub use definition::{CustomHandle, MetricDefinition, MetricKind};
pub use error::{ConfigurationError, ExposeError, InstrumentationError};
pub use middleware::track_requests;
pub use recorder::{Metrics, MetricsRecorder};
pub use summary::Summary;
