//! Relationship graph sink placeholder

use super::RelationshipWriter;
use crate::schema::Event;
use crate::Result;

use async_trait::async_trait;
use tracing::info;

/// Graph sink that accepts everything and stores nothing.
///
/// Stands in for a graph database client so one can be wired in later without
/// touching the ingestion coordinator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGraphWriter;

#[async_trait]
impl RelationshipWriter for NoopGraphWriter {
    async fn write_relationships(&self, event: &Event) -> Result<()> {
        if !event.relationships.is_empty() {
            info!(
                source = %event.source,
                relationships = %serde_json::Value::Object(event.relationships.clone()),
                "Would write relationships to graph store"
            );
        }
        Ok(())
    }
}
