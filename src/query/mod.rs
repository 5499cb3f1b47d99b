//! Query service for Tidepool
//!
//! The query service is responsible for:
//! - Validating request parameters
//! - Building store queries for the supported query kinds
//! - Executing them and normalizing tabular output into JSON-friendly rows
//! - Wrapping every outcome in a [`ResponseEnvelope`]

mod builder;
mod envelope;
mod executor;
mod telemetry;

pub use builder::{QueryBuilder, HEALTH_LOOKBACK_HOURS};
pub use envelope::{ResponseEnvelope, RESPONSE_HEADERS};
pub use executor::{normalize, QueryExecutor, ResultRow};

use crate::clock::{Clock, SystemClock};
use crate::timeseries::{TableCoordinates, TimeSeriesStore};
use crate::{Error, Result};

use chrono::SecondsFormat;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info_span, Instrument};

/// Raw request parameters as received from the HTTP layer.
pub type QueryParams = HashMap<String, String>;

/// Supported query kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Per-measure summary statistics
    Metrics,
    /// Hourly time buckets per measure
    Aggregated,
    /// Store connectivity probe
    Health,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Metrics => "metrics",
            QueryKind::Aggregated => "aggregated",
            QueryKind::Health => "health",
        }
    }

    /// Lookback applied when the request does not give `hours`.
    pub fn default_hours(&self) -> u32 {
        match self {
            QueryKind::Metrics => 1,
            QueryKind::Aggregated => 24,
            QueryKind::Health => HEALTH_LOOKBACK_HOURS,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "metrics" => Ok(Self::Metrics),
            "aggregated" => Ok(Self::Aggregated),
            "health" => Ok(Self::Health),
            other => Err(Error::InvalidRequest(format!(
                "Unsupported query type: {other}"
            ))),
        }
    }
}

/// A validated query request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub kind: QueryKind,
    /// Lookback window in hours
    pub hours: u32,
    /// Source filter (metrics only)
    pub source: Option<String>,
    /// Measure name filter (aggregated only)
    pub metric: Option<String>,
}

impl QueryRequest {
    /// Validate parameters for `kind`.
    ///
    /// `hours` must be a non-negative integer. Filters are kept as given; an
    /// empty one is echoed in the response but never reaches the query.
    pub fn from_params(kind: QueryKind, params: &QueryParams) -> Result<Self> {
        let hours = match kind {
            QueryKind::Health => HEALTH_LOOKBACK_HOURS,
            _ => match params.get("hours") {
                None => kind.default_hours(),
                Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                    Error::InvalidRequest(format!(
                        "hours must be a non-negative integer, got '{raw}'"
                    ))
                })?,
            },
        };

        let filter = |name: &str| params.get(name).cloned();

        Ok(Self {
            kind,
            hours,
            source: (kind == QueryKind::Metrics).then(|| filter("source")).flatten(),
            metric: (kind == QueryKind::Aggregated).then(|| filter("metric")).flatten(),
        })
    }
}

/// Query coordinator: routes requests, executes them and shapes the response.
pub struct QueryService {
    builder: QueryBuilder,
    executor: QueryExecutor,
    clock: Arc<dyn Clock>,
}

impl QueryService {
    pub fn new(coordinates: TableCoordinates, store: Arc<dyn TimeSeriesStore>) -> Self {
        Self::with_clock(coordinates, store, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(
        coordinates: TableCoordinates,
        store: Arc<dyn TimeSeriesStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            builder: QueryBuilder::new(coordinates),
            executor: QueryExecutor::new(store),
            clock,
        }
    }

    /// Handle a request end to end.
    ///
    /// An unrecognized `type` is answered with 200 and an `error` field;
    /// invalid parameters and store failures are answered with 500.
    pub async fn handle(&self, params: &QueryParams) -> ResponseEnvelope {
        let kind_param = params
            .get("type")
            .map(String::as_str)
            .unwrap_or(QueryKind::Metrics.as_str());
        let span = info_span!("query.handle", kind = %kind_param);

        async {
            let kind = match kind_param.parse::<QueryKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    telemetry::record_request(kind_param, "unsupported");
                    return ResponseEnvelope::ok(json!({ "error": unsupported_message(&e) }));
                }
            };

            let result = match QueryRequest::from_params(kind, params) {
                Ok(request) => self.handle_request(&request).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(body) => {
                    telemetry::record_request(kind.as_str(), "ok");
                    ResponseEnvelope::ok(body)
                }
                Err(e) => {
                    error!(error = %e, "Error processing query");
                    telemetry::record_request(kind.as_str(), "error");
                    ResponseEnvelope::failure(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Execute a validated request and build its response body.
    pub async fn handle_request(&self, request: &QueryRequest) -> Result<Value> {
        match request.kind {
            QueryKind::Metrics => {
                let results = self.executor.execute(&self.builder.build(request)).await?;
                Ok(json!({
                    "query_type": QueryKind::Metrics.as_str(),
                    "time_range_hours": request.hours,
                    "source_filter": request.source,
                    "results": results,
                    "timestamp": self.timestamp(),
                }))
            }
            QueryKind::Aggregated => {
                let results = self.executor.execute(&self.builder.build(request)).await?;
                Ok(json!({
                    "query_type": QueryKind::Aggregated.as_str(),
                    "time_range_hours": request.hours,
                    "metric_filter": request.metric,
                    "results": results,
                    "timestamp": self.timestamp(),
                }))
            }
            QueryKind::Health => Ok(self.health().await),
        }
    }

    /// Probe the store. Health depends only on whether the probe succeeded.
    pub async fn health(&self) -> Value {
        match self.executor.execute(&self.builder.health_query()).await {
            Ok(rows) => {
                telemetry::record_health_probe("healthy");
                let recent_records = rows
                    .first()
                    .and_then(|row| row.get("record_count"))
                    .cloned()
                    .unwrap_or_else(|| "0".to_string());
                json!({
                    "status": "healthy",
                    "store_connectivity": "ok",
                    "recent_records": recent_records,
                    "timestamp": self.timestamp(),
                })
            }
            Err(e) => {
                error!(error = %e, "Health check failed");
                telemetry::record_health_probe("unhealthy");
                json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                    "timestamp": self.timestamp(),
                })
            }
        }
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

fn unsupported_message(e: &Error) -> String {
    match e {
        Error::InvalidRequest(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("metrics".parse::<QueryKind>().unwrap(), QueryKind::Metrics);
        assert_eq!("aggregated".parse::<QueryKind>().unwrap(), QueryKind::Aggregated);
        assert_eq!("health".parse::<QueryKind>().unwrap(), QueryKind::Health);
        assert!("Metrics".parse::<QueryKind>().is_err(), "kinds are case-sensitive");
    }

    #[test]
    fn test_default_lookbacks() {
        let metrics = QueryRequest::from_params(QueryKind::Metrics, &params(&[])).unwrap();
        assert_eq!(metrics.hours, 1);
        let aggregated = QueryRequest::from_params(QueryKind::Aggregated, &params(&[])).unwrap();
        assert_eq!(aggregated.hours, 24);
    }

    #[test]
    fn test_health_ignores_hours() {
        let request =
            QueryRequest::from_params(QueryKind::Health, &params(&[("hours", "48")])).unwrap();
        assert_eq!(request.hours, HEALTH_LOOKBACK_HOURS);
    }

    #[test]
    fn test_hours_must_be_non_negative_integer() {
        for bad in ["-1", "abc", "1.5", ""] {
            let err = QueryRequest::from_params(QueryKind::Metrics, &params(&[("hours", bad)]))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)), "'{bad}' should be rejected");
        }
        let ok = QueryRequest::from_params(QueryKind::Metrics, &params(&[("hours", "0")])).unwrap();
        assert_eq!(ok.hours, 0);
    }

    #[test]
    fn test_filters_scoped_to_kind() {
        let p = params(&[("source", "sensor-1"), ("metric", "temperature")]);
        let metrics = QueryRequest::from_params(QueryKind::Metrics, &p).unwrap();
        assert_eq!(metrics.source.as_deref(), Some("sensor-1"));
        assert_eq!(metrics.metric, None);

        let aggregated = QueryRequest::from_params(QueryKind::Aggregated, &p).unwrap();
        assert_eq!(aggregated.source, None);
        assert_eq!(aggregated.metric.as_deref(), Some("temperature"));
    }

    #[test]
    fn test_empty_filter_is_kept() {
        let request =
            QueryRequest::from_params(QueryKind::Metrics, &params(&[("source", "")])).unwrap();
        assert_eq!(request.source.as_deref(), Some(""));
    }
}
