use figment::providers::{Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use crate::metrics::MetricDefinition;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: bind address, logging and the metric set.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Settings for the request-metrics collectors.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone, Default)]
pub struct MetricsConfig {
    /// Prefix applied to every metric name, e.g. "app".
    pub namespace: Option<String>,
    /// Upper bounds (in seconds) for the request duration histogram buckets.
    /// Defaults to the standard Prometheus buckets.
    pub duration_buckets: Option<Vec<f64>>,
    /// Maximum number of distinct `path` label values recorded for requests
    /// that match no route template. Further values collapse to "__other__".
    pub max_path_cardinality: Option<usize>,
    /// Additional caller-defined metrics registered alongside the defaults.
    #[serde(default)]
    pub custom_metrics: Vec<MetricDefinition>,
}

/// Load config from a YAML file named "config.yaml" in the current directory.
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new().merge(Yaml::file("./config.yaml"));
    let config = match figment.extract::<Config>() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    match config {
        Config::ConfigV1(c) => c,
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
