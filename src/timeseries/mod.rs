//! Time-series store client abstraction
//!
//! The store itself is external. [`TimeSeriesStore`] is the thin client
//! surface both pipelines rely on: batched record writes and string queries
//! returning tabular output.

mod http;
mod memory;
mod wire;

pub use http::HttpTimeSeriesStore;
pub use memory::InMemoryTimeSeriesStore;
pub use wire::{
    ColumnInfo, Datum, QueryResponse, QueryStatement, Row, WireDimension, WriteRecord,
    WriteRecordsRequest,
};

use crate::Result;
use async_trait::async_trait;

/// Database/table pair every write and query addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCoordinates {
    pub database: String,
    pub table: String,
}

impl TableCoordinates {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// Quoted `"database"."table"` reference for query text.
    pub fn qualified_name(&self) -> String {
        format!("\"{}\".\"{}\"", self.database, self.table)
    }
}

/// Client for the time-series store.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Submit a batch of records.
    async fn write_records(&self, request: WriteRecordsRequest) -> Result<()>;

    /// Run a query and return the raw tabular response.
    async fn query(&self, query: &str) -> Result<QueryResponse>;
}
