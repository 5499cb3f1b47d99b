//! Ingestion pipeline for Tidepool
//!
//! The ingester is responsible for:
//! - Decoding transport records into events
//! - Deriving measurements and dimensions from each event
//! - Writing measurements to the time-series store
//! - Archiving every decoded event (best-effort)
//!
//! Failures are contained per record: one bad record is counted and logged,
//! and the rest of the batch carries on.

pub mod decoder;
mod telemetry;
pub mod transform;

pub use decoder::decode;
pub use transform::Transformer;

use crate::clock::{Clock, SystemClock};
use crate::schema::{Event, IngestionOutcome, RawRecord};
use crate::sink::{
    ArchiveOutcome, EventArchiver, MeasurementWriter, NoopGraphWriter, RelationshipWriter,
};
use crate::Result;

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for the ingester
#[derive(Debug, Clone)]
pub struct IngesterConfig {
    /// Deployment region, attached to every measurement as a dimension
    pub region: String,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Ingestion coordinator
pub struct Ingester {
    transformer: Transformer,
    writer: Arc<dyn MeasurementWriter>,
    archiver: Arc<dyn EventArchiver>,
    graph: Arc<dyn RelationshipWriter>,
}

impl Ingester {
    /// Create a new ingester using the system clock
    pub fn new(
        config: IngesterConfig,
        writer: Arc<dyn MeasurementWriter>,
        archiver: Arc<dyn EventArchiver>,
    ) -> Self {
        Self::with_clock(config, writer, archiver, Arc::new(SystemClock::new()))
    }

    /// Create a new ingester with an explicit clock
    pub fn with_clock(
        config: IngesterConfig,
        writer: Arc<dyn MeasurementWriter>,
        archiver: Arc<dyn EventArchiver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transformer: Transformer::new(config.region, clock),
            writer,
            archiver,
            graph: Arc::new(NoopGraphWriter),
        }
    }

    /// Replace the relationship graph sink
    pub fn with_graph_writer(mut self, graph: Arc<dyn RelationshipWriter>) -> Self {
        self.graph = graph;
        self
    }

    /// Process a batch envelope `{"Records": [...]}`.
    ///
    /// Only a structurally invalid envelope is an error; record-level problems
    /// are reported through the returned counters.
    pub async fn process_envelope(&self, batch: &Value) -> Result<IngestionOutcome> {
        let records = RawRecord::batch_from_envelope(batch)?;
        Ok(self.process_batch(&records).await)
    }

    /// Process records in order, isolating failures per record.
    pub async fn process_batch(&self, records: &[RawRecord]) -> IngestionOutcome {
        let started = Instant::now();
        let span = info_span!("ingest.batch", records = records.len());

        let outcome = async {
            let mut outcome = IngestionOutcome::default();
            for (index, record) in records.iter().enumerate() {
                match self.process_record(record).await {
                    Ok(()) => {
                        outcome.processed += 1;
                        telemetry::record_outcome("processed");
                    }
                    Err(e) => {
                        error!(
                            index,
                            sequence_number = record.sequence_number.as_deref().unwrap_or("none"),
                            error = %e,
                            "Error processing individual record"
                        );
                        outcome.failed += 1;
                        telemetry::record_outcome("failed");
                    }
                }
            }
            outcome
        }
        .instrument(span)
        .await;

        telemetry::record_batch(started.elapsed().as_secs_f64(), records.len() as u64);
        info!(
            processed = outcome.processed,
            failed = outcome.failed,
            "Processed {} records successfully, {} failed",
            outcome.processed,
            outcome.failed
        );
        outcome
    }

    /// Decode, transform, write, then archive a single record.
    ///
    /// Only decode and write failures surface; archiving and graph writes are
    /// best-effort.
    pub async fn process_record(&self, record: &RawRecord) -> Result<()> {
        let event = decode(record)?;

        let measurements = self.transformer.build_measurements(&event);
        if !measurements.is_empty() {
            let started = Instant::now();
            self.writer.write(&measurements).await?;
            telemetry::record_write(
                started.elapsed().as_secs_f64(),
                measurements.len() as u64,
            );
            info!(count = measurements.len(), "Written records to time-series store");
        }

        let token = match &record.sequence_number {
            Some(token) => token.clone(),
            None => {
                let generated = uuid::Uuid::new_v4().to_string();
                warn!(key = %generated, "Record has no sequence number, archiving under generated key");
                generated
            }
        };
        self.archive_best_effort(&event, &token).await;

        if let Err(e) = self.graph.write_relationships(&event).await {
            warn!(error = %e, "Graph write failed");
        }

        Ok(())
    }

    /// Archive an event, logging instead of returning any failure.
    pub async fn archive_best_effort(&self, event: &Event, ordering_token: &str) -> ArchiveOutcome {
        match self.archiver.archive(event, ordering_token).await {
            Ok(key) => ArchiveOutcome::Archived { key },
            Err(e) => {
                error!(ordering_token, error = %e, "Error archiving raw event");
                telemetry::record_archive_failure();
                ArchiveOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
