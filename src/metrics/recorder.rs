//! Metrics recording implementation using Prometheus.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec, Encoder,
    HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use tracing::warn;

use crate::config::MetricsConfig;
use crate::utils::log_throttle::LogThrottle;

use super::cardinality::PathCardinalityLimiter;
use super::definition::{is_valid_metric_name, CustomHandle};
use super::error::{ConfigurationError, ExposeError};

/// Name of the request counter, before namespacing.
const REQUESTS_TOTAL: &str = "http_requests_total";
/// Name of the request duration histogram, before namespacing.
const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Distinct fallback path label values allowed unless configured otherwise.
const DEFAULT_MAX_PATH_CARDINALITY: usize = 100;

/// Minimum spacing between dropped-update warnings per metric.
const DROP_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Trait for recording request metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records one handled request with its response status.
    fn record_request(&self, method: &str, path: &str, status: u16);

    /// Records the duration of one handled request.
    fn record_request_duration(&self, method: &str, path: &str, duration_secs: f64);
}

/// Prometheus metrics collector.
///
/// Owns the registry together with every collector registered into it. The
/// same instance is shared between the request middleware and the scrape
/// endpoint; clones are cheap and update the same underlying state.
#[derive(Clone, Debug)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Request metrics
    http_requests_total: CounterVec,
    http_request_duration_seconds: HistogramVec,

    // Caller-defined metrics, keyed by their configured (un-namespaced) name
    custom: Arc<HashMap<String, CustomHandle>>,

    paths: Arc<PathCardinalityLimiter>,
    throttle: Arc<LogThrottle>,
}

impl Metrics {
    /// Creates a registry and registers the collectors described by `config`.
    ///
    /// Every definition is checked before anything is registered, so a
    /// failing call leaves no collector behind.
    pub fn new(config: &MetricsConfig) -> Result<Self, ConfigurationError> {
        let namespace = config.namespace.as_deref().filter(|ns| !ns.is_empty());
        if let Some(ns) = namespace {
            if !is_valid_metric_name(ns) {
                return Err(ConfigurationError::InvalidName(ns.to_string()));
            }
        }

        let buckets = match &config.duration_buckets {
            Some(buckets) => validated_buckets(buckets)?,
            None => prometheus::DEFAULT_BUCKETS.to_vec(),
        };

        // Check the whole custom set up front: kinds, names, labels and name
        // collisions among the customs and against the default collectors.
        let mut kinds = Vec::with_capacity(config.custom_metrics.len());
        let mut names: HashSet<String> = [REQUESTS_TOTAL, REQUEST_DURATION_SECONDS]
            .into_iter()
            .map(|name| fq_name(namespace, name))
            .collect();
        for def in &config.custom_metrics {
            let kind = def.validate()?;
            if !names.insert(fq_name(namespace, &def.name)) {
                return Err(ConfigurationError::DuplicateName(def.name.clone()));
            }
            kinds.push(kind);
        }

        let registry = Arc::new(Registry::new());

        let mut requests_opts = Opts::new(REQUESTS_TOTAL, "Total number of handled HTTP requests");
        if let Some(ns) = namespace {
            requests_opts = requests_opts.namespace(ns);
        }
        let http_requests_total = register_counter_vec_with_registry!(
            requests_opts,
            &["method", "path", "status"],
            registry.clone()
        )?;

        let mut duration_opts =
            HistogramOpts::new(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds")
                .buckets(buckets);
        if let Some(ns) = namespace {
            duration_opts = duration_opts.namespace(ns);
        }
        let http_request_duration_seconds = register_histogram_vec_with_registry!(
            duration_opts,
            &["method", "path"],
            registry.clone()
        )?;

        let mut custom = HashMap::with_capacity(config.custom_metrics.len());
        for (def, kind) in config.custom_metrics.iter().zip(kinds) {
            let handle = CustomHandle::build(def, kind, namespace, &registry)?;
            custom.insert(def.name.clone(), handle);
        }

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            custom: Arc::new(custom),
            paths: Arc::new(PathCardinalityLimiter::new(
                config
                    .max_path_cardinality
                    .unwrap_or(DEFAULT_MAX_PATH_CARDINALITY),
            )),
            throttle: Arc::new(LogThrottle::new()),
        })
    }

    /// Returns the handle for a caller-defined metric, keyed by the name it
    /// was configured with (without the namespace prefix).
    pub fn custom(&self, name: &str) -> Option<&CustomHandle> {
        self.custom.get(name)
    }

    /// Renders all registered collectors in Prometheus text format.
    ///
    /// Read-only; safe to call concurrently with in-flight recording.
    pub fn render(&self) -> Result<String, ExposeError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn log_dropped(&self, metric: &'static str, err: prometheus::Error) {
        if let Some(suppressed) = self.throttle.should_emit(metric, DROP_LOG_INTERVAL) {
            warn!(metric, suppressed, "dropped metric update: {}", err);
        }
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(&self, method: &str, path: &str, status: u16) {
        let path = self.paths.resolve(path);
        let status = status.to_string();
        match self
            .http_requests_total
            .get_metric_with_label_values(&[method, path, &status])
        {
            Ok(counter) => counter.inc(),
            Err(e) => self.log_dropped(REQUESTS_TOTAL, e),
        }
    }

    fn record_request_duration(&self, method: &str, path: &str, duration_secs: f64) {
        let path = self.paths.resolve(path);
        match self
            .http_request_duration_seconds
            .get_metric_with_label_values(&[method, path])
        {
            Ok(histogram) => histogram.observe(duration_secs),
            Err(e) => self.log_dropped(REQUEST_DURATION_SECONDS, e),
        }
    }
}

fn fq_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}_{}", ns, name),
        None => name.to_string(),
    }
}

fn validated_buckets(buckets: &[f64]) -> Result<Vec<f64>, ConfigurationError> {
    if buckets.is_empty()
        || buckets.iter().any(|b| !b.is_finite())
        || buckets.windows(2).any(|w| w[0] >= w[1])
    {
        return Err(ConfigurationError::InvalidBuckets);
    }
    Ok(buckets.to_vec())
}
