//! Ingestion telemetry instruments and recording helpers.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct IngestInstruments {
    records: Counter<u64>,
    archive_failures: Counter<u64>,
    measurements_written: Counter<u64>,
    write_duration_seconds: Histogram<f64>,
    batch_duration_seconds: Histogram<f64>,
    batch_size: Histogram<u64>,
}

fn instruments() -> &'static IngestInstruments {
    static INSTRUMENTS: OnceLock<IngestInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("tidepool.ingest");
        IngestInstruments {
            records: meter
                .u64_counter("tidepool.ingest.records")
                .with_description("Records handled by the ingestion coordinator, by outcome")
                .init(),
            archive_failures: meter
                .u64_counter("tidepool.ingest.archive.failures")
                .with_description("Raw events that could not be archived")
                .init(),
            measurements_written: meter
                .u64_counter("tidepool.ingest.measurements.written")
                .with_description("Measurements accepted by the time-series sink")
                .init(),
            write_duration_seconds: meter
                .f64_histogram("tidepool.ingest.write.duration")
                .with_description("Time-series write duration")
                .with_unit("s")
                .init(),
            batch_duration_seconds: meter
                .f64_histogram("tidepool.ingest.batch.duration")
                .with_description("End-to-end batch processing duration")
                .with_unit("s")
                .init(),
            batch_size: meter
                .u64_histogram("tidepool.ingest.batch.size")
                .with_description("Records per batch")
                .init(),
        }
    })
}

pub fn record_outcome(outcome: &'static str) {
    instruments()
        .records
        .add(1, &[KeyValue::new("outcome", outcome)]);
}

pub fn record_archive_failure() {
    instruments().archive_failures.add(1, &[]);
}

pub fn record_write(duration_seconds: f64, measurements: u64) {
    let i = instruments();
    i.measurements_written.add(measurements, &[]);
    i.write_duration_seconds.record(duration_seconds, &[]);
}

pub fn record_batch(duration_seconds: f64, records: u64) {
    let i = instruments();
    i.batch_duration_seconds.record(duration_seconds, &[]);
    i.batch_size.record(records, &[]);
}
