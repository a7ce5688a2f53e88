use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::{middleware, routing::get, Router};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use metricotron::config::{Config, ConfigV1};
use metricotron::metrics::{track_requests, Metrics};
use metricotron::routes::create_router;
use metricotron::state::AppState;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
bind_address: 127.0.0.1:8081
metrics:
  namespace: "app"
  duration_buckets: [0.1, 0.5, 1.0, 5.0]
"#;

pub fn load_test_config(yaml: &str) -> ConfigV1 {
    let config: Config = Figment::new()
        .merge(Yaml::string(yaml))
        .extract()
        .expect("Failed to parse test config YAML");

    match config {
        Config::ConfigV1(cfg) => cfg,
    }
}

/// Builds the application router (demo, health and metrics routes) with the
/// tracking middleware attached, mirroring `startup::run`.
#[allow(dead_code)]
pub fn build_app(config: ConfigV1) -> (Router, Metrics) {
    let config = Arc::new(config);
    let metrics = Metrics::new(&config.metrics).expect("metric registration failed");

    let state = AppState {
        config: config.clone(),
        metrics: metrics.clone(),
    };

    let app = create_router(state).layer(middleware::from_fn_with_state(
        metrics.clone(),
        track_requests::<Metrics>,
    ));

    (app, metrics)
}

/// Like [`build_app`], plus a templated route and a deliberately slow route
/// for exercising path normalization and duration bucketing.
#[allow(dead_code)]
pub fn build_test_app(config: ConfigV1) -> (Router, Metrics) {
    let config = Arc::new(config);
    let metrics = Metrics::new(&config.metrics).expect("metric registration failed");

    let state = AppState {
        config: config.clone(),
        metrics: metrics.clone(),
    };

    let app = create_router(state)
        .route("/users/:id", get(get_user))
        .route("/slow", get(slow))
        .layer(middleware::from_fn_with_state(
            metrics.clone(),
            track_requests::<Metrics>,
        ));

    (app, metrics)
}

async fn get_user(Path(id): Path<u64>) -> String {
    format!("user {}", id)
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(150)).await;
    "slow"
}

#[allow(dead_code)]
pub fn get_request(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

#[allow(dead_code)]
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("response body is not UTF-8")
}

/// Returns the value of the sample whose name and complete label set match,
/// independent of label ordering in the exposition text.
#[allow(dead_code)]
pub fn sample_value(text: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let want: HashMap<&str, &str> = labels.iter().copied().collect();

    for line in text.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((series, value)) = line.rsplit_once(' ') else {
            continue;
        };
        let (sample_name, label_text) = match series.split_once('{') {
            Some((n, rest)) => (n, rest.strip_suffix('}').unwrap_or(rest)),
            None => (series, ""),
        };
        if sample_name != name {
            continue;
        }

        let mut got = HashMap::new();
        if !label_text.is_empty() {
            for pair in label_text.split(',') {
                let Some((key, val)) = pair.split_once('=') else {
                    continue;
                };
                got.insert(key, val.trim_matches('"'));
            }
        }

        if got.len() == want.len() && want.iter().all(|(k, v)| got.get(k) == Some(v)) {
            return value.trim().parse().ok();
        }
    }

    None
}

#[allow(dead_code)]
pub fn count_lines_starting_with(text: &str, prefix: &str) -> usize {
    text.lines().filter(|line| line.starts_with(prefix)).count()
}
