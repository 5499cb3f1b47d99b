//! Output collaborators of the ingestion pipeline
//!
//! Each sink is a long-lived client built once per process and injected into
//! the [`Ingester`](crate::ingester::Ingester). The coordinator only sees the
//! capability traits below, so tests substitute doubles freely.

mod archive;
mod graph;
mod timeseries;

pub use archive::{archive_key, ObjectStoreArchiver, ARCHIVE_PREFIX};
pub use graph::NoopGraphWriter;
pub use timeseries::TimeSeriesWriter;

use crate::schema::{Event, Measurement};
use crate::Result;
use async_trait::async_trait;

/// Time-series sink.
#[async_trait]
pub trait MeasurementWriter: Send + Sync {
    /// Persist a non-empty set of measurements.
    ///
    /// Fails with [`Error::Write`](crate::Error::Write) on any sink-level failure.
    async fn write(&self, measurements: &[Measurement]) -> Result<()>;
}

/// Raw event archive.
#[async_trait]
pub trait EventArchiver: Send + Sync {
    /// Store the event under a key derived from the ordering token, returning the key.
    async fn archive(&self, event: &Event, ordering_token: &str) -> Result<String>;
}

/// Relationship graph sink.
#[async_trait]
pub trait RelationshipWriter: Send + Sync {
    async fn write_relationships(&self, event: &Event) -> Result<()>;
}

/// Result of a best-effort archive attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived { key: String },
    Failed { reason: String },
}

impl ArchiveOutcome {
    pub fn is_archived(&self) -> bool {
        matches!(self, ArchiveOutcome::Archived { .. })
    }
}
