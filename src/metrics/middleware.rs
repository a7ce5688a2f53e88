//! Request instrumentation middleware.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use super::MetricsRecorder;

/// Axum middleware that measures every request passing through the pipeline.
///
/// Records start time, delegates to the rest of the pipeline unconditionally,
/// then increments the request counter keyed by (method, path, status) and
/// observes the elapsed duration keyed by (method, path). The response is
/// returned unchanged.
///
/// The matched route template (e.g. `/users/:id`) is used as the `path` label
/// rather than the resolved URI, keeping label cardinality bounded no matter
/// how many distinct identifiers appear in requests. Requests that match no
/// route fall back to their raw path, which the recorder caps separately.
///
/// Recording runs after the response is obtained and is isolated with
/// `catch_unwind`: a failing recorder can drop a measurement, never the
/// response.
///
/// Attach with `axum::middleware::from_fn_with_state`:
///
/// ```ignore
/// let app = create_router(state)
///     .layer(middleware::from_fn_with_state(metrics, track_requests));
/// ```
pub async fn track_requests<M>(State(metrics): State<M>, request: Request, next: Next) -> Response
where
    M: MetricsRecorder,
{
    let start = Instant::now();
    let method = request.method().as_str().to_owned();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    let recorded = panic::catch_unwind(AssertUnwindSafe(|| {
        metrics.record_request(&method, &path, status);
        metrics.record_request_duration(&method, &path, elapsed);
    }));
    if recorded.is_err() {
        warn!(%method, %path, "metrics recording panicked; measurement dropped");
    }

    response
}
