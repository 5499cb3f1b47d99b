//! Object-store archive of raw events
//!
//! Keys are partitioned by UTC date: `raw-data/YYYY/MM/DD/<ordering token>.json`.
//! Server-side encryption is a property of the store client (see
//! [`ComponentFactory`](crate::config::ComponentFactory)).

use super::EventArchiver;
use crate::clock::Clock;
use crate::schema::Event;
use crate::{Error, Result};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::debug;

/// Root prefix for archived events
pub const ARCHIVE_PREFIX: &str = "raw-data";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Build the archive key for a record received at `at`.
pub fn archive_key(at: DateTime<Utc>, ordering_token: &str) -> String {
    format!(
        "{}/{}/{}.json",
        ARCHIVE_PREFIX,
        at.format("%Y/%m/%d"),
        ordering_token
    )
}

/// Archives decoded events as JSON objects.
pub struct ObjectStoreArchiver {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
}

impl ObjectStoreArchiver {
    pub fn new(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl EventArchiver for ObjectStoreArchiver {
    async fn archive(&self, event: &Event, ordering_token: &str) -> Result<String> {
        let key = archive_key(self.clock.now(), ordering_token);
        let body = serde_json::to_vec(event.payload())?;

        let opts = PutOptions {
            attributes: Attributes::from_iter([(Attribute::ContentType, CONTENT_TYPE_JSON)]),
            ..Default::default()
        };

        self.store
            .put_opts(&Path::from(key.as_str()), PutPayload::from(body), opts)
            .await
            .map_err(|e| Error::Archive(format!("failed to archive {key}: {e}")))?;

        debug!(key = %key, "Archived raw event");
        Ok(key)
    }
}
