//! Per-request HTTP instrumentation.

use std::time::Instant;

use axum::body::Body;
use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use super::body::CountingBody;
use super::recorder::MetricsRecorder;

/// Records request size, duration, count and response size for every
/// request routed through it.
///
/// Install with `route_layer` so the matched route template is available as
/// the `path` label; requests that match no route are not instrumented.
pub async fn track_http<R: MetricsRecorder>(
    State(recorder): State<R>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let method = request.method().as_str().to_owned();

    if let Some(length) = declared_content_length(request.headers()).filter(|len| *len > 0) {
        recorder.record_request_size(&path, &method, length);
    }

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    // An untouched axum response is already 200, so the label is never empty.
    let status_code = response.status().as_u16().to_string();
    recorder.record_http_request(&path, &method, &status_code, elapsed.as_secs_f64());
    debug!(
        %path,
        %method,
        status = %status_code,
        elapsed_ms = elapsed.as_millis() as u64,
        "request handled"
    );

    let (parts, body) = response.into_parts();
    let body = CountingBody::new(body, move |bytes| {
        recorder.record_response_size(&path, &method, &status_code, bytes);
    });
    Response::from_parts(parts, Body::new(body))
}

fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
