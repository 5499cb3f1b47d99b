//! # Tidepool
//!
//! Telemetry ingestion into a time-series store, with raw-event archival and
//! a small query service on top.
//!
//! ## Ingestion
//!
//! Batches of base64-encoded JSON events arrive from a stream trigger. Each
//! event is decoded, its numeric metrics become measurements tagged with
//! dimensions (`source`, `region`, and any short relationship values), the
//! measurements are written to the time-series store, and the raw event is
//! archived to object storage under a date-partitioned key. Failures are
//! isolated per record.
//!
//! ## Querying
//!
//! Three parameterized queries (`metrics`, `aggregated`, `health`) are built,
//! executed against the store and normalized into rows of strings, then
//! wrapped in an HTTP response envelope.

pub mod api;
pub mod clock;
pub mod config;
pub mod ingester;
pub mod query;
pub mod schema;
pub mod sink;
pub mod telemetry;
pub mod timeseries;

mod error;

pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::ingester::{Ingester, IngesterConfig};
    pub use crate::query::{QueryKind, QueryRequest, QueryService, ResponseEnvelope};
    pub use crate::schema::{Event, IngestionOutcome, Measurement, RawRecord};
    pub use crate::sink::{EventArchiver, MeasurementWriter, ObjectStoreArchiver, TimeSeriesWriter};
    pub use crate::timeseries::{TableCoordinates, TimeSeriesStore};
    pub use crate::{Error, Result};
}
