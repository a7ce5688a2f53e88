//! Configuration loading, validation schema and logging settings.

mod config;
mod logging;

pub use config::{load_config, print_schema, Config, ConfigV1, MetricsConfig};
pub use logging::LoggingConfig;
