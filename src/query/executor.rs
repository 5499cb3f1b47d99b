//! Query execution and result normalization

use super::telemetry;
use crate::timeseries::{QueryResponse, TimeSeriesStore};
use crate::{Error, Result};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// One result row: column name -> scalar rendered as a string.
pub type ResultRow = BTreeMap<String, String>;

/// Runs query text against the store. No retries at this layer.
pub struct QueryExecutor {
    store: Arc<dyn TimeSeriesStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn TimeSeriesStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, query: &str) -> Result<Vec<ResultRow>> {
        let started = Instant::now();
        info!(query = %query, "Executing query");

        let response = match self.store.query(query).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Error executing query");
                telemetry::record_execution(started.elapsed().as_secs_f64(), 0, "error");
                return Err(match e {
                    Error::Query(_) => e,
                    other => Error::Query(other.to_string()),
                });
            }
        };

        let rows = normalize(&response);
        telemetry::record_execution(started.elapsed().as_secs_f64(), rows.len() as u64, "ok");
        info!(rows = rows.len(), "Query returned {} rows", rows.len());
        Ok(rows)
    }
}

/// Zip declared columns with each row's positional values.
///
/// Unnamed columns become `column_<index>`; missing or null values become "".
pub fn normalize(response: &QueryResponse) -> Vec<ResultRow> {
    let columns: Vec<String> = response
        .column_info
        .iter()
        .enumerate()
        .map(|(i, column)| {
            column
                .name
                .clone()
                .unwrap_or_else(|| format!("column_{i}"))
        })
        .collect();

    response
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = row
                        .data
                        .get(i)
                        .and_then(|datum| datum.scalar_value.clone())
                        .unwrap_or_default();
                    (name.clone(), value)
                })
                .collect()
        })
        .collect()
}
