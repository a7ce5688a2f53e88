//! Caller-supplied metric definitions and their collector handles.

use std::fmt;
use std::str::FromStr;

use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{ConfigurationError, InstrumentationError};
use super::summary::Summary;

/// Declares one caller-defined metric to register alongside the defaults.
///
/// The kind is kept as a string so that configuration files can carry it
/// verbatim; it is parsed and checked during registration.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct MetricDefinition {
    /// Metric name, unique within the registry after namespacing.
    pub name: String,
    /// Help text shown on the `# HELP` exposition line.
    pub description: String,
    /// One of: counter, counter_vec, gauge, gauge_vec, histogram,
    /// histogram_vec, summary, summary_vec.
    pub kind: String,
    /// Ordered label names; required for `_vec` kinds, forbidden otherwise.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl MetricDefinition {
    /// Checks the definition without touching any registry and returns its
    /// parsed kind.
    pub fn validate(&self) -> Result<MetricKind, ConfigurationError> {
        let kind = self
            .kind
            .parse::<MetricKind>()
            .map_err(|_| ConfigurationError::UnrecognizedKind {
                name: self.name.clone(),
                kind: self.kind.clone(),
            })?;

        if !is_valid_metric_name(&self.name) {
            return Err(ConfigurationError::InvalidName(self.name.clone()));
        }
        for label in &self.labels {
            if !is_valid_label_name(label) {
                return Err(ConfigurationError::InvalidLabel {
                    name: self.name.clone(),
                    label: label.clone(),
                });
            }
        }

        if kind.is_vector() && self.labels.is_empty() {
            return Err(ConfigurationError::MissingLabels(self.name.clone()));
        }
        if !kind.is_vector() && !self.labels.is_empty() {
            return Err(ConfigurationError::UnexpectedLabels(self.name.clone()));
        }

        Ok(kind)
    }
}

/// The closed set of metric kinds: counter, gauge, histogram and summary,
/// each as a scalar or as a vector over labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    CounterVec,
    Gauge,
    GaugeVec,
    Histogram,
    HistogramVec,
    Summary,
    SummaryVec,
}

impl MetricKind {
    /// Whether this kind takes label values on every update.
    pub fn is_vector(self) -> bool {
        matches!(
            self,
            MetricKind::CounterVec
                | MetricKind::GaugeVec
                | MetricKind::HistogramVec
                | MetricKind::SummaryVec
        )
    }
}

impl FromStr for MetricKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricKind::Counter),
            "counter_vec" => Ok(MetricKind::CounterVec),
            "gauge" => Ok(MetricKind::Gauge),
            "gauge_vec" => Ok(MetricKind::GaugeVec),
            "histogram" => Ok(MetricKind::Histogram),
            "histogram_vec" => Ok(MetricKind::HistogramVec),
            "summary" => Ok(MetricKind::Summary),
            "summary_vec" => Ok(MetricKind::SummaryVec),
            _ => Err(()),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Counter => "counter",
            MetricKind::CounterVec => "counter_vec",
            MetricKind::Gauge => "gauge",
            MetricKind::GaugeVec => "gauge_vec",
            MetricKind::Histogram => "histogram",
            MetricKind::HistogramVec => "histogram_vec",
            MetricKind::Summary => "summary",
            MetricKind::SummaryVec => "summary_vec",
        };
        f.write_str(name)
    }
}

/// Handle to one registered caller-defined collector.
///
/// Each kind carries its own concrete collector and update logic; calling an
/// operation a kind does not support returns
/// [`InstrumentationError::KindMismatch`] rather than panicking.
#[derive(Clone, Debug)]
pub enum CustomHandle {
    Counter(Counter),
    CounterVec(CounterVec),
    Gauge(Gauge),
    GaugeVec(GaugeVec),
    Histogram(Histogram),
    HistogramVec(HistogramVec),
    Summary(Summary),
    SummaryVec(Summary),
}

impl CustomHandle {
    /// Builds the collector for a validated definition and registers it.
    pub(crate) fn build(
        def: &MetricDefinition,
        kind: MetricKind,
        namespace: Option<&str>,
        registry: &Registry,
    ) -> Result<Self, ConfigurationError> {
        let mut opts = Opts::new(def.name.clone(), def.description.clone());
        if let Some(ns) = namespace {
            opts = opts.namespace(ns);
        }
        let labels: Vec<&str> = def.labels.iter().map(String::as_str).collect();

        let handle = match kind {
            MetricKind::Counter => {
                let counter = Counter::with_opts(opts)?;
                registry.register(Box::new(counter.clone()))?;
                CustomHandle::Counter(counter)
            }
            MetricKind::CounterVec => {
                let counter = CounterVec::new(opts, &labels)?;
                registry.register(Box::new(counter.clone()))?;
                CustomHandle::CounterVec(counter)
            }
            MetricKind::Gauge => {
                let gauge = Gauge::with_opts(opts)?;
                registry.register(Box::new(gauge.clone()))?;
                CustomHandle::Gauge(gauge)
            }
            MetricKind::GaugeVec => {
                let gauge = GaugeVec::new(opts, &labels)?;
                registry.register(Box::new(gauge.clone()))?;
                CustomHandle::GaugeVec(gauge)
            }
            MetricKind::Histogram => {
                let opts = HistogramOpts {
                    common_opts: opts,
                    buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
                };
                let histogram = Histogram::with_opts(opts)?;
                registry.register(Box::new(histogram.clone()))?;
                CustomHandle::Histogram(histogram)
            }
            MetricKind::HistogramVec => {
                let opts = HistogramOpts {
                    common_opts: opts,
                    buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
                };
                let histogram = HistogramVec::new(opts, &labels)?;
                registry.register(Box::new(histogram.clone()))?;
                CustomHandle::HistogramVec(histogram)
            }
            MetricKind::Summary => {
                let summary = Summary::new(&def.name, &def.description, &def.labels, namespace)?;
                registry.register(Box::new(summary.clone()))?;
                CustomHandle::Summary(summary)
            }
            MetricKind::SummaryVec => {
                let summary = Summary::new(&def.name, &def.description, &def.labels, namespace)?;
                registry.register(Box::new(summary.clone()))?;
                CustomHandle::SummaryVec(summary)
            }
        };

        Ok(handle)
    }

    /// The kind this handle was registered with.
    pub fn kind(&self) -> MetricKind {
        match self {
            CustomHandle::Counter(_) => MetricKind::Counter,
            CustomHandle::CounterVec(_) => MetricKind::CounterVec,
            CustomHandle::Gauge(_) => MetricKind::Gauge,
            CustomHandle::GaugeVec(_) => MetricKind::GaugeVec,
            CustomHandle::Histogram(_) => MetricKind::Histogram,
            CustomHandle::HistogramVec(_) => MetricKind::HistogramVec,
            CustomHandle::Summary(_) => MetricKind::Summary,
            CustomHandle::SummaryVec(_) => MetricKind::SummaryVec,
        }
    }

    /// Increments a scalar counter or gauge by 1.
    pub fn inc(&self) -> Result<(), InstrumentationError> {
        match self {
            CustomHandle::Counter(counter) => {
                counter.inc();
                Ok(())
            }
            CustomHandle::Gauge(gauge) => {
                gauge.inc();
                Ok(())
            }
            other => Err(other.kind_mismatch("inc")),
        }
    }

    /// Increments one labeled series of a counter or gauge vector by 1.
    pub fn inc_with(&self, labels: &[&str]) -> Result<(), InstrumentationError> {
        match self {
            CustomHandle::CounterVec(counter) => {
                counter.get_metric_with_label_values(labels)?.inc();
                Ok(())
            }
            CustomHandle::GaugeVec(gauge) => {
                gauge.get_metric_with_label_values(labels)?.inc();
                Ok(())
            }
            other => Err(other.kind_mismatch("inc_with")),
        }
    }

    /// Sets a scalar gauge.
    pub fn set(&self, value: f64) -> Result<(), InstrumentationError> {
        match self {
            CustomHandle::Gauge(gauge) => {
                gauge.set(value);
                Ok(())
            }
            other => Err(other.kind_mismatch("set")),
        }
    }

    /// Sets one labeled series of a gauge vector.
    pub fn set_with(&self, labels: &[&str], value: f64) -> Result<(), InstrumentationError> {
        match self {
            CustomHandle::GaugeVec(gauge) => {
                gauge.get_metric_with_label_values(labels)?.set(value);
                Ok(())
            }
            other => Err(other.kind_mismatch("set_with")),
        }
    }

    /// Records an observation into a scalar histogram or summary.
    pub fn observe(&self, value: f64) -> Result<(), InstrumentationError> {
        match self {
            CustomHandle::Histogram(histogram) => {
                histogram.observe(value);
                Ok(())
            }
            CustomHandle::Summary(summary) => {
                summary.observe(&[], value)?;
                Ok(())
            }
            other => Err(other.kind_mismatch("observe")),
        }
    }

    /// Records an observation into one labeled series of a histogram or
    /// summary vector.
    pub fn observe_with(&self, labels: &[&str], value: f64) -> Result<(), InstrumentationError> {
        match self {
            CustomHandle::HistogramVec(histogram) => {
                histogram.get_metric_with_label_values(labels)?.observe(value);
                Ok(())
            }
            CustomHandle::SummaryVec(summary) => {
                summary.observe(labels, value)?;
                Ok(())
            }
            other => Err(other.kind_mismatch("observe_with")),
        }
    }

    fn kind_mismatch(&self, op: &'static str) -> InstrumentationError {
        InstrumentationError::KindMismatch {
            kind: self.kind(),
            op,
        }
    }
}

/// Valid Prometheus metric name: `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub(crate) fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Valid Prometheus label name: `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    fn def(name: &str, kind: &str, labels: &[&str]) -> MetricDefinition {
        MetricDefinition {
            name: name.to_string(),
            description: format!("{} help", name),
            kind: kind.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn parses_every_kind() {
        let kinds = [
            ("counter", MetricKind::Counter),
            ("counter_vec", MetricKind::CounterVec),
            ("gauge", MetricKind::Gauge),
            ("gauge_vec", MetricKind::GaugeVec),
            ("histogram", MetricKind::Histogram),
            ("histogram_vec", MetricKind::HistogramVec),
            ("summary", MetricKind::Summary),
            ("summary_vec", MetricKind::SummaryVec),
        ];
        for (text, kind) in kinds {
            assert_eq!(text.parse::<MetricKind>(), Ok(kind));
            assert_eq!(kind.to_string(), text);
        }
    }

    #[test]
    fn rejects_unrecognized_kind() {
        let err = def("test_metric", "meter", &[]).validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnrecognizedKind { .. }));
    }

    #[test]
    fn vector_kind_requires_labels() {
        let err = def("test_metric", "counter_vec", &[]).validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingLabels(_)));
    }

    #[test]
    fn scalar_kind_rejects_labels() {
        let err = def("test_metric", "counter", &["queue"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnexpectedLabels(_)));
    }

    #[test]
    fn rejects_invalid_names() {
        let err = def("9starts_with_digit", "counter", &[]).validate().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidName(_)));

        let err = def("test_metric", "counter_vec", &["bad-label"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidLabel { .. }));
    }

    #[test]
    fn counter_handle_rejects_observe() {
        let registry = Registry::new();
        let definition = def("jobs_total", "counter", &[]);
        let kind = definition.validate().unwrap();
        let handle = CustomHandle::build(&definition, kind, None, &registry).unwrap();

        handle.inc().unwrap();
        assert!(matches!(
            handle.observe(1.0),
            Err(InstrumentationError::KindMismatch { .. })
        ));
    }

    #[test]
    fn gauge_vec_updates_labeled_series() {
        let registry = Registry::new();
        let definition = def("queue_depth", "gauge_vec", &["queue"]);
        let kind = definition.validate().unwrap();
        let handle = CustomHandle::build(&definition, kind, None, &registry).unwrap();

        handle.set_with(&["fast"], 3.0).unwrap();
        handle.inc_with(&["fast"]).unwrap();
        assert!(matches!(
            handle.set_with(&["fast", "extra"], 1.0),
            Err(InstrumentationError::Collector(_))
        ));
    }
}
