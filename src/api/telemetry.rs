//! Per-route HTTP metrics and request spans.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, UpDownCounter};
use opentelemetry::KeyValue;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info_span, Instrument};

struct HttpMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
    in_flight: UpDownCounter<i64>,
}

impl HttpMetrics {
    fn get() -> &'static Self {
        static METRICS: OnceLock<HttpMetrics> = OnceLock::new();
        METRICS.get_or_init(|| {
            let meter = global::meter("tidepool.api.http");
            HttpMetrics {
                requests: meter
                    .u64_counter("tidepool.http.requests")
                    .with_description("HTTP requests by route and status class")
                    .init(),
                duration: meter
                    .f64_histogram("tidepool.http.duration")
                    .with_description("HTTP request latency")
                    .with_unit("s")
                    .init(),
                in_flight: meter
                    .i64_up_down_counter("tidepool.http.in_flight")
                    .with_description("Requests currently being served")
                    .init(),
            }
        })
    }

    fn finish(&self, method: &str, route: &str, status: StatusCode, elapsed: Duration) {
        let attrs = [
            KeyValue::new("http.request.method", method.to_string()),
            KeyValue::new("http.route", route.to_string()),
            KeyValue::new("http.status_class", status_class(status)),
        ];
        self.requests.add(1, &attrs);
        self.duration.record(elapsed.as_secs_f64(), &attrs);
    }
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

/// Wraps every request in an `http.request` span and records its outcome.
pub async fn http_observability_middleware(req: Request<Body>, next: Next) -> Response {
    let metrics = HttpMetrics::get();
    let method = req.method().clone();
    // Unmatched paths share one route label
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let span = info_span!(
        "http.request",
        otel.kind = "server",
        http.request.method = %method,
        http.route = %route,
        http.response.status_code = tracing::field::Empty,
    );

    metrics.in_flight.add(1, &[]);
    let started = Instant::now();
    let response = next.run(req).instrument(span.clone()).await;
    metrics.in_flight.add(-1, &[]);

    let status = response.status();
    span.record("http.response.status_code", status.as_u16());
    metrics.finish(method.as_str(), &route, status, started.elapsed());

    response
}
