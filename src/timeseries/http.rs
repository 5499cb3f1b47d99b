//! HTTP client for a time-series store gateway
//!
//! Writes are POSTed to `{endpoint}/v1/write` and queries to
//! `{endpoint}/v1/query`, both as JSON in the store wire format.

use super::{QueryResponse, QueryStatement, TimeSeriesStore, WriteRecordsRequest};
use crate::{Error, Result};

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Store client speaking JSON over HTTP.
///
/// The underlying [`Client`] pools connections, so one instance should be
/// shared for the life of the process.
pub struct HttpTimeSeriesStore {
    client: Client,
    endpoint: String,
}

impl HttpTimeSeriesStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

async fn error_body(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("store returned {status}")
    } else {
        format!("store returned {status}: {body}")
    }
}

#[async_trait]
impl TimeSeriesStore for HttpTimeSeriesStore {
    async fn write_records(&self, request: WriteRecordsRequest) -> Result<()> {
        let records = request.records.len();
        let response = self
            .client
            .post(format!("{}/v1/write", self.endpoint))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Write(error_body(response).await));
        }

        debug!(records, table = %request.table_name, "Store accepted records");
        Ok(())
    }

    async fn query(&self, query: &str) -> Result<QueryResponse> {
        let response = self
            .client
            .post(format!("{}/v1/query", self.endpoint))
            .json(&QueryStatement {
                query_string: query.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Query(error_body(response).await));
        }

        Ok(response.json::<QueryResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let store =
            HttpTimeSeriesStore::new("http://localhost:9000/", Duration::from_secs(5)).unwrap();
        assert_eq!(store.endpoint(), "http://localhost:9000");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_error() {
        // Port 9 (discard) is not expected to host a store gateway
        let store =
            HttpTimeSeriesStore::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(store.query("SELECT 1").await.is_err());
    }
}
