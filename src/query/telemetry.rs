//! Query-path telemetry instruments and recording helpers.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct QueryInstruments {
    query_requests: Counter<u64>,
    query_duration_seconds: Histogram<f64>,
    query_rows_returned: Histogram<u64>,
    health_probes: Counter<u64>,
}

fn instruments() -> &'static QueryInstruments {
    static INSTRUMENTS: OnceLock<QueryInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("tidepool.query");
        QueryInstruments {
            query_requests: meter
                .u64_counter("tidepool.query.requests")
                .with_description("Query requests by kind and outcome")
                .init(),
            query_duration_seconds: meter
                .f64_histogram("tidepool.query.duration")
                .with_description("Store query latency")
                .with_unit("s")
                .init(),
            query_rows_returned: meter
                .u64_histogram("tidepool.query.rows_returned")
                .with_description("Rows returned per query")
                .init(),
            health_probes: meter
                .u64_counter("tidepool.query.health_probes")
                .with_description("Health probe results")
                .init(),
        }
    })
}

pub fn record_request(kind: &str, outcome: &'static str) {
    instruments().query_requests.add(
        1,
        &[
            KeyValue::new("kind", kind.to_string()),
            KeyValue::new("outcome", outcome),
        ],
    );
}

pub fn record_execution(duration_seconds: f64, rows: u64, outcome: &'static str) {
    let i = instruments();
    let attrs = [KeyValue::new("outcome", outcome)];
    i.query_duration_seconds.record(duration_seconds, &attrs);
    i.query_rows_returned.record(rows, &attrs);
}

pub fn record_health_probe(status: &'static str) {
    instruments()
        .health_probes
        .add(1, &[KeyValue::new("status", status)]);
}
