//! Data model shared by the ingestion and query pipelines
//!
//! Raw transport records decode into an [`Event`]; events fan out into
//! [`Measurement`]s tagged with a [`Dimension`] set for the time-series store.

mod event;
mod measurement;

pub use event::{Event, RawRecord, DEFAULT_SOURCE};
pub use measurement::{
    Dimension,
    IngestionOutcome,
    MeasureValueType,
    Measurement,
    TimeUnit,
    MAX_DIMENSION_VALUE_LEN,
    REGION_DIMENSION,
    SOURCE_DIMENSION,
};
