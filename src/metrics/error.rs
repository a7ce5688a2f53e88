//! Error taxonomy for metric registration, recording and exposition.

use thiserror::Error;

use super::definition::MetricKind;

/// Raised synchronously while building the collector set. Always fatal to
/// startup; the process must not serve with an inconsistent metric set.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("duplicate metric name '{0}'")]
    DuplicateName(String),
    #[error("unrecognized metric kind '{kind}' for metric '{name}'")]
    UnrecognizedKind { name: String, kind: String },
    #[error("invalid metric name '{0}'")]
    InvalidName(String),
    #[error("invalid label name '{label}' on metric '{name}'")]
    InvalidLabel { name: String, label: String },
    #[error("metric '{0}' is a vector kind and must declare at least one label")]
    MissingLabels(String),
    #[error("metric '{0}' is a scalar kind and must not declare labels")]
    UnexpectedLabels(String),
    #[error("duration buckets must be a non-empty, strictly increasing sequence of finite values")]
    InvalidBuckets,
    #[error("failed to register collector: {0}")]
    Registry(#[from] prometheus::Error),
}

/// A failed collector update. Never propagated into request handling: the
/// recording path logs and swallows these.
#[derive(Debug, Error)]
pub enum InstrumentationError {
    #[error("operation '{op}' is not supported by a {kind} metric")]
    KindMismatch { kind: MetricKind, op: &'static str },
    #[error("collector update failed: {0}")]
    Collector(#[from] prometheus::Error),
}

/// A failure while rendering the exposition text. Surfaced as a 500 from the
/// scrape endpoint only.
#[derive(Debug, Error)]
pub enum ExposeError {
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
    #[error("metrics encoding produced invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
