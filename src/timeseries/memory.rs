//! In-process time-series store for development and tests

use super::{QueryResponse, TimeSeriesStore, WriteRecordsRequest};
use crate::{Error, Result};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Records every write and answers queries from a scripted queue.
///
/// Queries with nothing scripted get an empty result.
#[derive(Default)]
pub struct InMemoryTimeSeriesStore {
    writes: Mutex<Vec<WriteRecordsRequest>>,
    write_failure: Mutex<Option<String>>,
    queries: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<std::result::Result<QueryResponse, String>>>,
}

impl InMemoryTimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next query.
    pub fn push_response(&self, response: QueryResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Make the next query fail with `message`.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// Reject every write from now on.
    pub fn fail_writes(&self, message: impl Into<String>) {
        *self.write_failure.lock() = Some(message.into());
    }

    /// Accept writes again.
    pub fn accept_writes(&self) {
        *self.write_failure.lock() = None;
    }

    pub fn writes(&self) -> Vec<WriteRecordsRequest> {
        self.writes.lock().clone()
    }

    pub fn record_count(&self) -> usize {
        self.writes.lock().iter().map(|w| w.records.len()).sum()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl TimeSeriesStore for InMemoryTimeSeriesStore {
    async fn write_records(&self, request: WriteRecordsRequest) -> Result<()> {
        if let Some(message) = self.write_failure.lock().clone() {
            return Err(Error::Write(message));
        }
        self.writes.lock().push(request);
        Ok(())
    }

    async fn query(&self, query: &str) -> Result<QueryResponse> {
        self.queries.lock().push(query.to_string());
        match self.responses.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(Error::Query(message)),
            None => Ok(QueryResponse::default()),
        }
    }
}
