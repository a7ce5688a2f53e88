//! Summary collector reporting sample count and sum.
//!
//! The `prometheus` crate does not ship a summary type, so this collector
//! implements the objective-less form: per-series observation count and sum,
//! which is exactly what a summary with no quantile objectives exposes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use prometheus::core::{Collector, Desc};
use prometheus::proto;

#[derive(Debug, Default)]
struct SummarySeries {
    count: u64,
    sum: f64,
}

/// A summary metric, optionally keyed by labels.
///
/// With an empty label set it behaves as a scalar summary with a single
/// series that exists from registration time.
#[derive(Clone, Debug)]
pub struct Summary {
    desc: Desc,
    label_names: Vec<String>,
    series: Arc<Mutex<HashMap<Vec<String>, SummarySeries>>>,
}

impl Summary {
    /// Creates a summary named `name` (prefixed by `namespace` when given)
    /// with the supplied variable label names.
    pub fn new(
        name: &str,
        help: &str,
        label_names: &[String],
        namespace: Option<&str>,
    ) -> Result<Self, prometheus::Error> {
        let fq_name = match namespace {
            Some(ns) if !ns.is_empty() => format!("{}_{}", ns, name),
            _ => name.to_string(),
        };
        let desc = Desc::new(fq_name, help.to_string(), label_names.to_vec(), HashMap::new())?;

        let mut series = HashMap::new();
        if label_names.is_empty() {
            series.insert(Vec::new(), SummarySeries::default());
        }

        Ok(Summary {
            desc,
            label_names: label_names.to_vec(),
            series: Arc::new(Mutex::new(series)),
        })
    }

    /// Records one observation for the given label values.
    pub fn observe(&self, label_values: &[&str], value: f64) -> Result<(), prometheus::Error> {
        if label_values.len() != self.label_names.len() {
            return Err(prometheus::Error::InconsistentCardinality {
                expect: self.label_names.len(),
                got: label_values.len(),
            });
        }

        let mut series = self.series.lock().expect("summary mutex poisoned");
        let entry = series
            .entry(label_values.iter().map(|v| v.to_string()).collect())
            .or_default();
        entry.count += 1;
        entry.sum += value;
        Ok(())
    }
}

impl Collector for Summary {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let series = self.series.lock().expect("summary mutex poisoned");

        let mut family = proto::MetricFamily::default();
        family.set_name(self.desc.fq_name.clone());
        family.set_help(self.desc.help.clone());
        family.set_field_type(proto::MetricType::SUMMARY);

        for (values, data) in series.iter() {
            let mut metric = proto::Metric::default();
            for (name, value) in self.label_names.iter().zip(values) {
                let mut pair = proto::LabelPair::default();
                pair.set_name(name.clone());
                pair.set_value(value.clone());
                metric.mut_label().push(pair);
            }

            let mut summary = proto::Summary::default();
            summary.set_sample_count(data.count);
            summary.set_sample_sum(data.sum);
            metric.set_summary(summary);

            family.mut_metric().push(metric);
        }

        vec![family]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_summary_reports_count_and_sum() {
        let summary =
            Summary::new("job_duration_seconds", "Job duration", &[], Some("app")).unwrap();
        summary.observe(&[], 1.5).unwrap();
        summary.observe(&[], 2.5).unwrap();

        let families = summary.collect();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.get_name(), "app_job_duration_seconds");
        assert_eq!(family.get_field_type(), proto::MetricType::SUMMARY);

        let metric = &family.get_metric()[0];
        assert_eq!(metric.get_summary().get_sample_count(), 2);
        assert!((metric.get_summary().get_sample_sum() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scalar_summary_exists_before_first_observation() {
        let summary = Summary::new("idle_seconds", "Idle time", &[], None).unwrap();
        let families = summary.collect();
        let metric = &families[0].get_metric()[0];
        assert_eq!(metric.get_summary().get_sample_count(), 0);
    }

    #[test]
    fn labeled_summary_keys_series_by_label_values() {
        let labels = vec!["queue".to_string()];
        let summary = Summary::new("wait_seconds", "Queue wait", &labels, None).unwrap();
        summary.observe(&["fast"], 0.5).unwrap();
        summary.observe(&["fast"], 0.5).unwrap();
        summary.observe(&["slow"], 4.0).unwrap();

        let families = summary.collect();
        assert_eq!(families[0].get_metric().len(), 2);
    }

    #[test]
    fn rejects_wrong_label_cardinality() {
        let labels = vec!["queue".to_string()];
        let summary = Summary::new("wait_seconds", "Queue wait", &labels, None).unwrap();
        assert!(matches!(
            summary.observe(&[], 1.0),
            Err(prometheus::Error::InconsistentCardinality { .. })
        ));
    }
}
