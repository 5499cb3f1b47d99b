//! Query service tests
//!
//! End-to-end request handling through [`QueryService::handle`] with a
//! scripted in-memory store:
//! - Query text for each kind
//! - Response bodies and envelope status codes
//! - Health probe outcomes

use tidepool::clock::FixedClock;
use tidepool::query::{QueryParams, QueryService, RESPONSE_HEADERS};
use tidepool::timeseries::{InMemoryTimeSeriesStore, QueryResponse, TableCoordinates};

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

fn service(store: Arc<InMemoryTimeSeriesStore>) -> QueryService {
    QueryService::with_clock(
        TableCoordinates::new("iot", "readings"),
        store,
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
        )),
    )
}

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const TIMESTAMP: &str = "2024-06-01T12:30:00.000000Z";

// =========================================================================
// metrics
// =========================================================================

#[tokio::test]
async fn test_metrics_query_with_source_filter() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store.push_response(QueryResponse::from_table(
        &["measure_name", "avg_value", "max_value", "min_value", "count", "source"],
        &[&["temperature", "25.3", "30.1", "20.4", "12", "sensor-1"]],
    ));
    let service = service(store.clone());

    let envelope = service
        .handle(&params(&[("type", "metrics"), ("hours", "2"), ("source", "sensor-1")]))
        .await;

    assert_eq!(envelope.status_code, 200);
    let queries = store.queries();
    assert_eq!(queries.len(), 1);
    let where_line = queries[0]
        .lines()
        .find(|line| line.starts_with("WHERE"))
        .expect("query has a WHERE clause");
    assert_eq!(where_line, "WHERE time > ago(2h) AND source = 'sensor-1'");

    assert_eq!(
        envelope.body,
        json!({
            "query_type": "metrics",
            "time_range_hours": 2,
            "source_filter": "sensor-1",
            "results": [{
                "avg_value": "25.3",
                "count": "12",
                "max_value": "30.1",
                "measure_name": "temperature",
                "min_value": "20.4",
                "source": "sensor-1",
            }],
            "timestamp": TIMESTAMP,
        })
    );
}

#[tokio::test]
async fn test_type_defaults_to_metrics() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let envelope = service(store.clone()).handle(&params(&[])).await;

    assert_eq!(envelope.status_code, 200);
    assert_eq!(envelope.body["query_type"], "metrics");
    assert_eq!(envelope.body["time_range_hours"], 1);
    assert!(envelope.body["source_filter"].is_null());
    assert!(store.queries()[0].contains("WHERE time > ago(1h)\n"));
}

#[tokio::test]
async fn test_empty_source_is_echoed_but_not_filtered() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let envelope = service(store.clone())
        .handle(&params(&[("type", "metrics"), ("source", "")]))
        .await;

    assert_eq!(envelope.status_code, 200);
    assert_eq!(envelope.body["source_filter"], "");
    assert!(store.queries()[0].contains("WHERE time > ago(1h)\n"));
    assert!(!store.queries()[0].contains("source = "));
}

#[tokio::test]
async fn test_empty_metric_is_echoed_but_not_filtered() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let envelope = service(store.clone())
        .handle(&params(&[("type", "aggregated"), ("metric", "")]))
        .await;

    assert_eq!(envelope.body["metric_filter"], "");
    assert!(!store.queries()[0].contains("measure_name = "));
}

#[tokio::test]
async fn test_zero_rows_is_empty_results() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store.push_response(QueryResponse::from_table(&["measure_name", "avg_value"], &[]));

    let envelope = service(store).handle(&params(&[("type", "metrics")])).await;

    assert_eq!(envelope.status_code, 200, "empty result is not an error");
    assert_eq!(envelope.body["results"], json!([]));
}

// =========================================================================
// aggregated
// =========================================================================

#[tokio::test]
async fn test_aggregated_query_with_metric_filter() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store.push_response(QueryResponse::from_table(
        &["time_bucket", "measure_name", "avg_value", "count"],
        &[
            &["2024-06-01 12:00:00.000000000", "humidity", "51.2", "40"],
            &["2024-06-01 11:00:00.000000000", "humidity", "49.8", "60"],
        ],
    ));
    let service = service(store.clone());

    let envelope = service
        .handle(&params(&[("type", "aggregated"), ("metric", "humidity"), ("source", "ignored")]))
        .await;

    assert_eq!(envelope.status_code, 200);
    assert_eq!(envelope.body["query_type"], "aggregated");
    assert_eq!(envelope.body["time_range_hours"], 24);
    assert_eq!(envelope.body["metric_filter"], "humidity");
    assert!(envelope.body.get("source_filter").is_none());
    assert_eq!(envelope.body["results"].as_array().unwrap().len(), 2);

    let query = &store.queries()[0];
    assert!(query.contains("WHERE time > ago(24h) AND measure_name = 'humidity'\n"));
    assert!(!query.contains("source = "), "source filter only applies to metrics");
}

// =========================================================================
// health
// =========================================================================

#[tokio::test]
async fn test_health_healthy() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store.push_response(QueryResponse::from_table(&["record_count"], &[&["1834"]]));

    let envelope = service(store).handle(&params(&[("type", "health")])).await;

    assert_eq!(envelope.status_code, 200);
    assert_eq!(
        envelope.body,
        json!({
            "status": "healthy",
            "store_connectivity": "ok",
            "recent_records": "1834",
            "timestamp": TIMESTAMP,
        })
    );
}

#[tokio::test]
async fn test_health_without_rows_reports_zero() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let envelope = service(store).handle(&params(&[("type", "health")])).await;
    assert_eq!(envelope.body["status"], "healthy");
    assert_eq!(envelope.body["recent_records"], "0");
}

#[tokio::test]
async fn test_health_unhealthy_surfaces_error() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store.push_failure("AccessDeniedException: not authorized");

    let envelope = service(store).handle(&params(&[("type", "health")])).await;

    assert_eq!(envelope.status_code, 200, "health reports failure in the body");
    assert_eq!(envelope.body["status"], "unhealthy");
    let error = envelope.error().expect("unhealthy body carries error");
    assert!(
        error.contains("AccessDeniedException: not authorized"),
        "probe message should be surfaced, got: {error}"
    );
}

#[tokio::test]
async fn test_health_ignores_hours() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    service(store.clone())
        .handle(&params(&[("type", "health"), ("hours", "not-a-number")]))
        .await;
    assert!(store.queries()[0].ends_with("WHERE time > ago(1h)"));
}

// =========================================================================
// errors and envelope
// =========================================================================

#[tokio::test]
async fn test_unsupported_type_is_200_with_error() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let envelope = service(store.clone()).handle(&params(&[("type", "bogus")])).await;

    assert_eq!(envelope.status_code, 200);
    assert_eq!(envelope.body, json!({"error": "Unsupported query type: bogus"}));
    assert!(store.queries().is_empty(), "no query should reach the store");
}

#[tokio::test]
async fn test_invalid_hours_is_500() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    let envelope = service(store.clone())
        .handle(&params(&[("type", "metrics"), ("hours", "-3")]))
        .await;

    assert_eq!(envelope.status_code, 500);
    assert!(envelope.error().is_some());
    assert!(store.queries().is_empty());
}

#[tokio::test]
async fn test_store_failure_is_500() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store.push_failure("ThrottlingException");

    let envelope = service(store)
        .handle(&params(&[("type", "aggregated")]))
        .await;

    assert_eq!(envelope.status_code, 500);
    assert!(envelope.error().unwrap().contains("ThrottlingException"));
}

#[tokio::test]
async fn test_every_envelope_carries_cors_headers() {
    let store = Arc::new(InMemoryTimeSeriesStore::new());
    store.push_failure("down");
    let service = service(store);

    for p in [
        params(&[("type", "metrics")]),
        params(&[("type", "aggregated")]),
        params(&[("type", "bogus")]),
    ] {
        let envelope = service.handle(&p).await;
        for (name, value) in RESPONSE_HEADERS {
            assert_eq!(envelope.header(name), Some(value), "missing {name} for {p:?}");
        }
    }
}
