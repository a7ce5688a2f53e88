//! Cardinality limiter for the request path label.

use std::collections::HashSet;
use std::sync::Mutex;

/// Label value recorded once the distinct-path cap has been reached.
pub(crate) const OVERFLOW_PATH: &str = "__other__";

/// Caps the number of distinct `path` label values a collector can take.
///
/// Matched route templates are naturally bounded, but requests that match no
/// route carry their raw path. Once `max_values` distinct values have been
/// seen, new values map to [`OVERFLOW_PATH`] so a flood of unmatched paths
/// cannot grow the label space without bound.
#[derive(Debug)]
pub(crate) struct PathCardinalityLimiter {
    known: Mutex<HashSet<String>>,
    max_values: usize,
}

impl PathCardinalityLimiter {
    pub(crate) fn new(max_values: usize) -> Self {
        Self {
            known: Mutex::new(HashSet::new()),
            max_values,
        }
    }

    /// Resolves a path to the label value to record.
    ///
    /// Known values pass through unchanged; new values are admitted while
    /// under the cap and collapse to [`OVERFLOW_PATH`] afterwards.
    pub(crate) fn resolve<'a>(&self, path: &'a str) -> &'a str {
        let mut known = self.known.lock().expect("cardinality mutex poisoned");
        if known.contains(path) {
            path
        } else if known.len() < self.max_values {
            known.insert(path.to_string());
            path
        } else {
            OVERFLOW_PATH
        }
    }
}
