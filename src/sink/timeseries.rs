//! Time-series sink backed by a [`TimeSeriesStore`]

use super::MeasurementWriter;
use crate::schema::Measurement;
use crate::timeseries::{TableCoordinates, TimeSeriesStore, WriteRecord, WriteRecordsRequest};
use crate::{Error, Result};

use async_trait::async_trait;
use std::sync::Arc;

/// Writes measurements into the configured database/table.
pub struct TimeSeriesWriter {
    store: Arc<dyn TimeSeriesStore>,
    coordinates: TableCoordinates,
}

impl TimeSeriesWriter {
    pub fn new(store: Arc<dyn TimeSeriesStore>, coordinates: TableCoordinates) -> Self {
        Self { store, coordinates }
    }

    fn request(&self, measurements: &[Measurement]) -> WriteRecordsRequest {
        WriteRecordsRequest {
            database_name: self.coordinates.database.clone(),
            table_name: self.coordinates.table.clone(),
            records: measurements.iter().map(WriteRecord::from).collect(),
        }
    }
}

#[async_trait]
impl MeasurementWriter for TimeSeriesWriter {
    async fn write(&self, measurements: &[Measurement]) -> Result<()> {
        if measurements.is_empty() {
            return Ok(());
        }

        self.store
            .write_records(self.request(measurements))
            .await
            .map_err(|e| match e {
                Error::Write(_) => e,
                other => Error::Write(other.to_string()),
            })
    }
}
